use std::path::{Path, PathBuf};

use clap::Parser;

/// Encoding used for the written atlas image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum AtlasFormat {
    #[value(name = "png")]
    Png,
    #[value(name = "tga")]
    Tga,
    #[value(name = "bmp")]
    Bmp,
}

impl AtlasFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            AtlasFormat::Png => "png",
            AtlasFormat::Tga => "tga",
            AtlasFormat::Bmp => "bmp",
        }
    }

    pub fn image_format(&self) -> image::ImageFormat {
        match self {
            AtlasFormat::Png => image::ImageFormat::Png,
            AtlasFormat::Tga => image::ImageFormat::Tga,
            AtlasFormat::Bmp => image::ImageFormat::Bmp,
        }
    }
}

impl std::fmt::Display for AtlasFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Atlas generation parameters.
#[derive(Debug, Clone)]
pub struct AtlasConfig {
    pub format: AtlasFormat,
    /// RGBA colour of atlas pixels not covered by any texture.
    pub background: [u8; 4],
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            format: AtlasFormat::Png,
            background: [0, 0, 0, 0],
        }
    }
}

/// Fully resolved bake configuration (constructed from CLI args).
#[derive(Debug, Clone)]
pub struct BakeConfig {
    pub input: PathBuf,
    pub output_mesh: PathBuf,
    pub output_material: PathBuf,
    pub output_atlas: PathBuf,
    pub report: Option<PathBuf>,
    pub atlas: AtlasConfig,
    pub dry_run: bool,
    pub verbose: bool,
    pub threads: Option<usize>,
}

impl Default for BakeConfig {
    fn default() -> Self {
        Self::for_input(PathBuf::new())
    }
}

impl BakeConfig {
    /// Configuration with every output placed next to `input`.
    pub fn for_input(input: impl Into<PathBuf>) -> Self {
        let input = input.into();
        let atlas = AtlasConfig::default();
        Self {
            output_mesh: derived_path(&input, "baked.obj"),
            output_material: derived_path(&input, "baked.mtl"),
            output_atlas: derived_path(&input, &format!("baked.{}", atlas.format.extension())),
            input,
            report: None,
            atlas,
            dry_run: false,
            verbose: false,
            threads: None,
        }
    }
}

/// `model.obj` + `baked.mtl` -> `model.obj.baked.mtl`.
pub fn derived_path(input: &Path, suffix: &str) -> PathBuf {
    let mut name = input.as_os_str().to_owned();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

/// CLI argument definition (clap derive).
#[derive(Parser, Debug)]
#[command(
    name = "bake-obj",
    about = "Bakes the per-material textures of an OBJ mesh into a single texture atlas",
    version
)]
pub struct CliArgs {
    /// Input OBJ file
    #[arg(short = 'i', long)]
    pub input: PathBuf,

    /// Output OBJ file (default: <input>.baked.obj)
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Output MTL file (default: <input>.baked.mtl)
    #[arg(long)]
    pub material: Option<PathBuf>,

    /// Output atlas image (default: <input>.baked.<format>)
    #[arg(long)]
    pub atlas: Option<PathBuf>,

    /// Atlas image format
    #[arg(long, value_enum, default_value = "png")]
    pub atlas_format: AtlasFormat,

    /// Write the atlas layout as JSON to this path
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Pack and report without writing any files
    #[arg(long)]
    pub dry_run: bool,

    /// Enable verbose logging
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Worker thread count (default: all cores)
    #[arg(short = 'j', long)]
    pub threads: Option<usize>,
}

impl From<CliArgs> for BakeConfig {
    fn from(args: CliArgs) -> Self {
        let atlas = AtlasConfig {
            format: args.atlas_format,
            ..Default::default()
        };
        BakeConfig {
            output_mesh: args
                .output
                .unwrap_or_else(|| derived_path(&args.input, "baked.obj")),
            output_material: args
                .material
                .unwrap_or_else(|| derived_path(&args.input, "baked.mtl")),
            output_atlas: args.atlas.unwrap_or_else(|| {
                derived_path(&args.input, &format!("baked.{}", atlas.format.extension()))
            }),
            input: args.input,
            report: args.report,
            atlas,
            dry_run: args.dry_run,
            verbose: args.verbose,
            threads: args.threads,
        }
    }
}
