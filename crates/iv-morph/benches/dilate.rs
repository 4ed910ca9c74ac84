use criterion::{Criterion, black_box, criterion_group, criterion_main};
use iv_core::Interval;
use iv_core::IntervalDomain;
use iv_morph::{DistanceType, ElementDim, circle, dilate_domains, std_struct_element};

/// Comb of vertical bars so every line carries many runs.
fn comb(height: i32, teeth: i32) -> IntervalDomain {
    let line: Vec<Interval> = (0..teeth).map(|t| Interval::new(t * 12, t * 12 + 5)).collect();
    IntervalDomain::from_runs(0, vec![line; height as usize]).expect("runs")
}

fn bench_dilate(c: &mut Criterion) {
    let obj = comb(512, 64);
    let disc = circle(7.0, 0.0, 0.0).expect("circle");
    let element = disc.as_2d().expect("2d").domain.clone();

    c.bench_function("iv_morph_dilate_comb_by_disc_r7", |b| {
        b.iter(|| {
            let out = dilate_domains(black_box(&obj), black_box(&element)).expect("dilate");
            black_box(out.interval_count());
        });
    });

    c.bench_function("iv_morph_std_element_octagonal_r10", |b| {
        b.iter(|| {
            let el = std_struct_element(ElementDim::Planar, DistanceType::Octagonal, black_box(10.0)).expect("element");
            black_box(el.is_empty());
        });
    });
}

criterion_group!(benches, bench_dilate);
criterion_main!(benches);
