use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    rc::Rc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "lomo", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Develop a photo with a built-in look and write a PNG.
    Develop(DevelopArgs),
    /// Run a custom effect stack described in JSON.
    Fx(FxArgs),
}

#[derive(Parser, Debug)]
struct DevelopArgs {
    /// Input photo (any format the image crate can decode).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Look to apply.
    #[arg(long, value_enum)]
    look: LookChoice,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct FxArgs {
    /// Input photo (any format the image crate can decode).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Effect stack JSON (an array of tagged effect configs).
    #[arg(long)]
    effects: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LookChoice {
    Bw,
    Color,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Develop(args) => cmd_develop(args),
        Command::Fx(args) => cmd_fx(args),
    }
}

fn read_photo(path: &Path) -> anyhow::Result<lomo::Surface> {
    let img = image::open(path).with_context(|| format!("open photo '{}'", path.display()))?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(lomo::Surface::from_rgba8(width, height, rgba.into_raw())?)
}

fn write_png(surface: &lomo::Surface, out: &Path) -> anyhow::Result<()> {
    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        out,
        surface.data(),
        surface.width(),
        surface.height(),
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", out.display()))?;

    Ok(())
}

fn cmd_develop(args: DevelopArgs) -> anyhow::Result<()> {
    let photo = read_photo(&args.in_path)?;

    let look = match args.look {
        LookChoice::Bw => lomo::Look::BlackWhite,
        LookChoice::Color => lomo::Look::Color,
    };

    let mut darkroom = lomo::Darkroom::new(Rc::new(lomo::Bus::new()));
    darkroom.boot(true)?;
    darkroom.load_photo(photo)?;
    darkroom.apply_look(look)?;
    let frame = darkroom.save()?;

    write_png(frame, &args.out)?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_fx(args: FxArgs) -> anyhow::Result<()> {
    let mut photo = read_photo(&args.in_path)?;

    let f = File::open(&args.effects)
        .with_context(|| format!("open effects '{}'", args.effects.display()))?;
    let r = BufReader::new(f);
    let effects: Vec<lomo::Effect> =
        serde_json::from_reader(r).with_context(|| "parse effects JSON")?;

    let mut painter = lomo::Painter::new();
    lomo::apply_effects(&effects, &mut photo, &mut painter)?;

    write_png(&photo, &args.out)?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}
