use std::io::Cursor;
use std::rc::Rc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use iv_codec::{WireReader, read_object, write_objects};
use iv_core::{GreyType, GreyValues, Interval, IntervalDomain, Object, Object2D, PixelValue};

/// Disc with a ring of holes, so most lines carry several runs.
fn perforated_disc(radius: i32) -> Object {
    let mut lines = Vec::new();
    for y in -radius..=radius {
        let half = ((radius * radius - y * y) as f64).sqrt() as i32;
        let mut runs = Vec::new();
        let mut left = -half;
        for hole in (-half + 8..half - 8).step_by(24) {
            if y % 16 == 0 {
                runs.push(Interval::new(left, hole));
                left = hole + 4;
            }
        }
        runs.push(Interval::new(left, half));
        lines.push(runs);
    }
    let domain = IntervalDomain::from_runs(-radius, lines).expect("runs");
    let mut values = GreyValues::new_for_domain(&domain, GreyType::Short, PixelValue::Int(0)).expect("values");
    for (line, runs) in domain.lines() {
        for itv in runs.iter() {
            for k in itv.left..=itv.right {
                values.set(line, k, PixelValue::Int(line * 3 - k)).expect("in table");
            }
        }
    }
    Object::Domain2D(Object2D::with_values(Rc::new(domain), Rc::new(values)))
}

fn bench_codec(c: &mut Criterion) {
    let obj = perforated_disc(400);
    let bytes = write_objects(Vec::new(), [&obj]).expect("encode");

    c.bench_function("iv_codec_write_disc_r400", |b| {
        b.iter(|| {
            let out = write_objects(Vec::with_capacity(bytes.len()), [black_box(&obj)]).expect("encode");
            black_box(out.len());
        });
    });

    c.bench_function("iv_codec_read_disc_r400", |b| {
        b.iter(|| {
            let mut r = WireReader::new(Cursor::new(black_box(bytes.as_slice())));
            let back = read_object(&mut r).expect("decode");
            black_box(back.is_empty());
        });
    });
}

criterion_group!(benches, bench_codec);
criterion_main!(benches);
