use std::fs;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use iv_codec::{read_objects, write_objects};
use iv_core::{Compound, CompoundKind, DVertex3, Object, ObjectType, PlaneSlot};
use iv_edge::{CentralDifference, EdgeConfig, edge_detect};
use iv_morph::{DistanceType, ElementDim, StdElementConfig, dilate};
use iv_section::{ViewStruct, segment};

#[derive(Parser, Debug)]
#[command(name = "iv_tools")]
#[command(about = "Stream interval objects through dilation, sectioning and edge detection")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Gather objects of the first domain type into a compound array.
    #[command(name = "compound")]
    Compound(CompoundArgs),
    /// Dilate every object by a structuring element.
    #[command(name = "dilate")]
    Dilate(DilateArgs),
    /// Write a standard structuring element.
    #[command(name = "std-element")]
    StdElement(StdElementArgs),
    /// Split volumes by a cutting plane.
    #[command(name = "segment")]
    Segment(SegmentArgs),
    /// Gradient edges of 2D objects.
    #[command(name = "edges")]
    Edges(EdgesArgs),
    /// Print a JSON summary of every object.
    #[command(name = "info")]
    Info(InfoArgs),
}

#[derive(Args, Debug, Clone)]
struct IoArgs {
    /// Object stream to read, stdin when absent.
    #[arg(long)]
    input: Option<PathBuf>,
    /// Object stream to write, stdout when absent.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
struct CompoundArgs {
    #[command(flatten)]
    io: IoArgs,
    #[arg(short = 'n', default_value_t = 100)]
    max: usize,
}

#[derive(Args, Debug, Clone)]
struct DilateArgs {
    #[command(flatten)]
    io: IoArgs,
    /// File whose first object is the structuring element.
    #[arg(long, required = true)]
    element: PathBuf,
}

#[derive(Args, Debug, Clone)]
struct StdElementArgs {
    #[arg(long)]
    output: Option<PathBuf>,
    /// JSON element config, overridden by the flags below.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    radius: Option<f64>,
    /// 4, 8, 6, 18, 26, octagonal or euclidean.
    #[arg(long)]
    distance: Option<DistanceType>,
    /// 2 or 3.
    #[arg(long)]
    dim: Option<u8>,
}

#[derive(Args, Debug, Clone)]
struct SegmentArgs {
    #[command(flatten)]
    io: IoArgs,
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    theta: f64,
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    phi: f64,
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    zeta: f64,
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    dist: f64,
    /// Fixed point as `x,y,z`.
    #[arg(long, value_delimiter = ',', default_value = "0,0,0", allow_negative_numbers = true)]
    fixed: Vec<f64>,
}

#[derive(Args, Debug, Clone)]
struct EdgesArgs {
    #[command(flatten)]
    io: IoArgs,
    /// JSON edge config.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
struct InfoArgs {
    #[arg(long)]
    input: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct ObjectSummary {
    index: usize,
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    bounds: Option<Bounds>,
    #[serde(skip_serializing_if = "Option::is_none")]
    intervals: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pixels: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    grey: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    members: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct Bounds {
    #[serde(skip_serializing_if = "Option::is_none")]
    planes: Option<[i32; 2]>,
    lines: [i32; 2],
    columns: [i32; 2],
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.cmd {
        Command::Compound(args) => run_compound(args),
        Command::Dilate(args) => run_dilate(args),
        Command::StdElement(args) => run_std_element(args),
        Command::Segment(args) => run_segment(args),
        Command::Edges(args) => run_edges(args),
        Command::Info(args) => run_info(args),
    }
}

fn run_compound(args: CompoundArgs) -> Result<()> {
    if args.max < 1 {
        bail!("-n must be at least 1, got {}", args.max);
    }
    let input = open_input(args.io.input.as_deref())?;
    let Some(compound) = gather_compound(read_objects(input), args.max)? else {
        warn!("no 2D or 3D domain objects in the input");
        return Ok(());
    };
    write_output(args.io.output.as_deref(), &[compound])
}

/// Up to `max` objects of the type of the first domain object seen.
fn gather_compound(objects: impl Iterator<Item = iv_core::Result<Object>>, max: usize) -> Result<Option<Object>> {
    let mut kind: Option<ObjectType> = None;
    let mut members = Vec::new();
    for obj in objects {
        if members.len() >= max {
            break;
        }
        let obj = obj.context("decoding input object")?;
        let ty = obj.object_type();
        if kind.is_none() && matches!(ty, ObjectType::Domain2D | ObjectType::Domain3D) {
            kind = Some(ty);
        }
        if kind == Some(ty) {
            members.push(Rc::new(obj));
        }
    }
    if kind.is_none() {
        return Ok(None);
    }
    info!("gathered {} objects", members.len());
    Ok(Some(Object::Compound(Compound {
        kind: CompoundKind::Array2,
        element_type: None,
        objects: members,
        properties: None,
    })))
}

fn run_dilate(args: DilateArgs) -> Result<()> {
    let element = read_all(Some(&args.element))?
        .into_iter()
        .next()
        .with_context(|| format!("no structuring element in {}", args.element.display()))?;
    let objects = read_all(args.io.input.as_deref())?;
    let out = objects
        .iter()
        .enumerate()
        .map(|(i, obj)| dilate(obj, &element).with_context(|| format!("dilating object {i}")))
        .collect::<Result<Vec<_>>>()?;
    write_output(args.io.output.as_deref(), &out)
}

fn run_std_element(args: StdElementArgs) -> Result<()> {
    let mut cfg: StdElementConfig = match &args.config {
        Some(path) => read_json(path).with_context(|| format!("loading element config {}", path.display()))?,
        None => StdElementConfig::default(),
    };
    if let Some(r) = args.radius {
        cfg.radius = r;
    }
    if let Some(d) = args.distance {
        cfg.distance = d;
    }
    match args.dim {
        None => {}
        Some(2) => cfg.dim = ElementDim::Planar,
        Some(3) => cfg.dim = ElementDim::Volume,
        Some(other) => bail!("--dim must be 2 or 3, got {other}"),
    }
    let element = cfg
        .build()
        .with_context(|| format!("building {:?} element of radius {}", cfg.distance, cfg.radius))?;
    write_output(args.output.as_deref(), &[element])
}

fn run_segment(args: SegmentArgs) -> Result<()> {
    let [x, y, z] = args.fixed[..] else {
        bail!("--fixed needs three comma separated values, got {}", args.fixed.len());
    };
    let mut view = ViewStruct::new(DVertex3::new(x, y, z), args.theta, args.phi, args.zeta, args.dist);
    view.init();

    let mut out = Vec::new();
    for (i, obj) in read_all(args.io.input.as_deref())?.iter().enumerate() {
        let (negative, positive) = segment(obj, Some(&view)).with_context(|| format!("segmenting object {i}"))?;
        out.push(negative);
        out.push(positive);
    }
    write_output(args.io.output.as_deref(), &out)
}

fn run_edges(args: EdgesArgs) -> Result<()> {
    let cfg: EdgeConfig = match &args.config {
        Some(path) => read_json(path).with_context(|| format!("loading edge config {}", path.display()))?,
        None => EdgeConfig::default(),
    };
    let mut out = Vec::new();
    for (i, obj) in read_all(args.io.input.as_deref())?.iter().enumerate() {
        let result =
            edge_detect(obj, &CentralDifference, &cfg).with_context(|| format!("detecting edges of object {i}"))?;
        out.push(result.edges);
        out.extend(result.gradient);
    }
    write_output(args.io.output.as_deref(), &out)
}

fn run_info(args: InfoArgs) -> Result<()> {
    let summaries: Vec<ObjectSummary> = read_all(args.input.as_deref())?
        .iter()
        .enumerate()
        .map(|(i, obj)| summarize(i, obj))
        .collect();
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &summaries).context("writing summary")?;
    writeln!(stdout).context("writing summary")?;
    Ok(())
}

fn summarize(index: usize, obj: &Object) -> ObjectSummary {
    let mut s = ObjectSummary {
        index,
        kind: obj.object_type().name(),
        bounds: None,
        intervals: None,
        pixels: None,
        grey: None,
        members: None,
    };
    match obj {
        Object::Domain2D(o) if !o.domain.is_empty() => {
            let d = &o.domain;
            s.bounds = Some(Bounds {
                planes: None,
                lines: [d.line_first(), d.line_last()],
                columns: [d.column_first(), d.column_last()],
            });
            s.intervals = Some(d.interval_count());
            s.pixels = Some(d.area());
            s.grey = o.grey_type().map(|t| t.name());
        }
        Object::Domain3D(o) if !obj.is_empty() => {
            let d = &o.domain;
            s.bounds = Some(Bounds {
                planes: Some([d.plane_first(), d.plane_last()]),
                lines: [d.line_first(), d.line_last()],
                columns: [d.column_first(), d.column_last()],
            });
            s.intervals = Some(
                d.planes()
                    .filter_map(|(_, slot)| match slot {
                        PlaneSlot::Interval(dom) => Some(dom.interval_count()),
                        _ => None,
                    })
                    .sum(),
            );
            s.pixels = Some(d.volume());
            s.grey = o
                .values
                .as_ref()
                .and_then(|v| v.planes().find_map(|(_, t)| t.map(|t| t.grey_type().name())));
        }
        Object::Compound(c) => s.members = Some(c.objects.len()),
        _ => {}
    }
    s
}

fn open_input(path: Option<&Path>) -> Result<Box<dyn Read>> {
    Ok(match path {
        Some(p) => Box::new(BufReader::new(
            fs::File::open(p).with_context(|| format!("opening {}", p.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin().lock())),
    })
}

fn read_all(path: Option<&Path>) -> Result<Vec<Object>> {
    let what = path.map_or_else(|| "stdin".to_owned(), |p| p.display().to_string());
    read_objects(open_input(path)?)
        .enumerate()
        .map(|(i, obj)| obj.with_context(|| format!("decoding object {i} from {what}")))
        .collect()
}

fn write_output(path: Option<&Path>, objects: &[Object]) -> Result<()> {
    let sink: Box<dyn Write> = match path {
        Some(p) => Box::new(BufWriter::new(
            fs::File::create(p).with_context(|| format!("creating {}", p.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    write_objects(sink, objects).context("encoding output objects")?;
    Ok(())
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&data).with_context(|| format!("parsing json {}", path.display()))
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::{gather_compound, summarize};
    use iv_core::{Interval, IntervalDomain, Object, ObjectType, PlaneDomain, PlaneDomainKind, PlaneSlot};

    fn flat(k: i32) -> Object {
        Object::domain_2d(IntervalDomain::from_runs(0, vec![vec![Interval::new(k, k + 2)]]).expect("runs"))
    }

    fn volume() -> Object {
        let mut pd = PlaneDomain::new(PlaneDomainKind::Interval, 1, 2, 0, 0, 0, 2).expect("planes");
        let dom = IntervalDomain::from_runs(0, vec![vec![Interval::new(0, 2)]]).expect("runs");
        pd.set_plane(2, PlaneSlot::Interval(Rc::new(dom))).expect("set");
        pd.standardize();
        Object::domain_3d(pd)
    }

    #[test]
    fn compound_keeps_first_domain_type() {
        let input = vec![Ok(Object::Empty), Ok(flat(0)), Ok(volume()), Ok(flat(5)), Ok(flat(9))];
        let out = gather_compound(input.into_iter(), 2).expect("gather").expect("compound");
        let Object::Compound(c) = out else {
            panic!("expected a compound");
        };
        assert_eq!(c.objects.len(), 2);
        assert!(c.objects.iter().all(|o| o.object_type() == ObjectType::Domain2D));

        let none = gather_compound(vec![Ok(Object::Empty)].into_iter(), 10).expect("gather");
        assert!(none.is_none());
    }

    #[test]
    fn summary_reports_bounds() {
        let s = summarize(0, &flat(3));
        assert_eq!(s.kind, "2d-domain");
        assert_eq!(s.pixels, Some(3));
        let json = serde_json::to_value(summarize(1, &volume())).expect("json");
        assert_eq!(json["bounds"]["planes"], serde_json::json!([2, 2]));
        assert_eq!(json["intervals"], 1);
        assert!(json.get("grey").is_none());
    }
}
