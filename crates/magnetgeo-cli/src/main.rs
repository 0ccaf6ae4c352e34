//! magnetgeo CLI - inspect magnet records and tag exported geometries
//!
//! Records are read from the working directory, one `{name}.toml` (or
//! `{name}.json`) per record.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use magnetgeo::{layout, CachedResolver, FileStore, Part, Resolver};
use magnetgeo_ir::Format;
use magnetgeo_xao::{mesh_sizes, reconcile, regions, GroupPolicy, XaoDocument};

#[derive(Parser)]
#[command(name = "magnetgeo")]
#[command(about = "Magnet geometry records, solid names and physical groups", long_about = None)]
struct Cli {
    /// Directory holding the records
    #[arg(long, global = true, default_value = ".")]
    wd: PathBuf,

    /// Record format to read
    #[arg(long, global = true, value_enum, default_value_t = RecordFormat::Toml)]
    format: RecordFormat,

    /// Log every derivation step
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RecordFormat {
    Toml,
    Json,
}

impl From<RecordFormat> for Format {
    fn from(format: RecordFormat) -> Self {
        match format {
            RecordFormat::Toml => Format::Toml,
            RecordFormat::Json => Format::Json,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print the solid names of a record, in backend order
    Names {
        /// Record name
        record: String,
        /// Axisymmetric model
        #[arg(long = "2d")]
        is2d: bool,
        /// Prefix for the names
        #[arg(long, default_value = "")]
        mname: String,
    },
    /// Print the physical groups of an exported geometry as JSON
    Groups {
        /// Record name
        record: String,
        /// XAO file exported for the record
        xao: PathBuf,
        /// Axisymmetric model
        #[arg(long = "2d")]
        is2d: bool,
        /// Items to hide (Isolants)
        #[arg(long, num_args = 1..)]
        hide: Vec<String>,
        /// Items to group (Isolants, Leads, CoolingChannels)
        #[arg(long, num_args = 1..)]
        group: Vec<String>,
        /// The geometry carries an air region (implied by "Air" in the file name)
        #[arg(long)]
        air: bool,
        /// Mesh lengths per magnet, then for the air
        #[arg(long, num_args = 1..)]
        lc: Vec<f64>,
    },
    /// Rewrite a record in another format
    Convert {
        /// Record name
        record: String,
        /// Target format
        #[arg(long, value_enum)]
        to: RecordFormat,
    },
    /// Display kind, bounding box and mesh length of a record
    Info {
        /// Record name
        record: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();

    let store = FileStore::new(&cli.wd).with_format(cli.format.into());

    match cli.command {
        Commands::Names {
            record,
            is2d,
            mname,
        } => show_names(&store, &record, is2d, &mname)?,
        Commands::Groups {
            record,
            xao,
            is2d,
            hide,
            group,
            air,
            lc,
        } => {
            let policy = GroupPolicy::from_options(hide.as_slice(), group.as_slice());
            show_groups(&store, &record, &xao, is2d, air, &policy, &lc)?;
        }
        Commands::Convert { record, to } => convert(&store, &record, to.into())?,
        Commands::Info { record } => show_info(&store, &record)?,
    }

    Ok(())
}

fn load(store: &dyn Resolver, name: &str) -> Result<magnetgeo_ir::Record> {
    store
        .record(name)
        .with_context(|| format!("Failed to load record {name}"))
}

fn show_names(store: &FileStore, name: &str, is2d: bool, mname: &str) -> Result<()> {
    let cache = CachedResolver::new(store);
    let record = load(&cache, name)?;
    let layout = layout(&record, mname, is2d, &cache)
        .with_context(|| format!("Failed to derive the names of {name}"))?;
    for solid in &layout.solid_names {
        println!("{solid}");
    }
    Ok(())
}

fn show_groups(
    store: &FileStore,
    name: &str,
    xao: &Path,
    is2d: bool,
    air: bool,
    policy: &GroupPolicy,
    lc: &[f64],
) -> Result<()> {
    let cache = CachedResolver::new(store);
    let record = load(&cache, name)?;
    let mut layout = layout(&record, "", is2d, &cache)
        .with_context(|| format!("Failed to derive the layout of {name}"))?;
    let doc = XaoDocument::load(xao)?;

    let with_air = air
        || xao
            .file_name()
            .and_then(|f| f.to_str())
            .is_some_and(|f| f.contains("Air"));
    if with_air {
        layout.push_air();
    }

    let groups = reconcile(&doc, &layout, is2d, policy)
        .with_context(|| format!("Failed to build physical groups from {}", xao.display()))?;
    let user = (!lc.is_empty()).then_some(lc);
    let sizes = mesh_sizes(&layout.boxes, with_air, user)?;
    let output = serde_json::json!({
        "groups": groups,
        "mesh": {
            "regions": regions(&layout.boxes, &sizes),
            "background": sizes.last(),
        },
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    info!(records = cache.cached(), "Done");
    Ok(())
}

fn convert(store: &FileStore, name: &str, to: Format) -> Result<()> {
    let record = load(store, name)?;
    let target = FileStore::new(store.root()).with_format(to);
    let path = target.dump(&record)?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn show_info(store: &FileStore, name: &str) -> Result<()> {
    let cache = CachedResolver::new(store);
    let record = load(&cache, name)?;

    println!("{}: {}", record.kind(), record.name());
    let bbox = record
        .bounding_box(&cache)
        .with_context(|| format!("{name} has no bounding box"))?;
    println!("  r: [{}, {}]", bbox.r[0], bbox.r[1]);
    println!("  z: [{}, {}]", bbox.z[0], bbox.z[1]);
    println!("  Mesh length: {}", record.mesh_length(&cache)?);

    let names = record.names("", false, &cache)?;
    let isolants = record.isolants("", &cache)?;
    println!("  Solids: {} ({} insulating)", names.len(), isolants.len());
    Ok(())
}
