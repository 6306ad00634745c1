use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser, ValueEnum};
use color_print::{ceprintln, cprintln};
use e20_asm::asm::encoding::{BinaryFormat, ImageFormat, MemFormat};
use e20_asm::asm::{assemble_debug, Image};
use e20_asm::ast::sim::SimInstr;
use e20_asm::err::Error;

#[derive(Parser, Debug)]
#[command(name = "e20asm", version, about = "Assembler for the E20 ISA")]
struct AppArgs {
    /// Assembly source file
    input: PathBuf,
    /// Output file [default: INPUT with a .bin extension]
    output: Option<PathBuf>,
    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Mem)]
    format: Format,
    /// Print a disassembly listing of the assembled image
    #[arg(short, long)]
    dump: bool,
    /// Log more (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    /// `ram[i] = 16'b...;` listing
    Mem,
    /// Little-endian words
    Bin,
}

/// An error reading the source or writing the image.
#[derive(Debug)]
struct FileErr {
    action: &'static str,
    path: PathBuf,
    source: std::io::Error,
}
impl std::fmt::Display for FileErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cannot {} {}: {}", self.action, self.path.display(), self.source)
    }
}
impl std::error::Error for FileErr {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}
impl Error for FileErr {
    fn help(&self) -> Option<std::borrow::Cow<str>> {
        match self.source.kind() {
            std::io::ErrorKind::NotFound => Some("check that the path exists".into()),
            std::io::ErrorKind::PermissionDenied => Some("check the file's permissions".into()),
            _ => None,
        }
    }
}

fn main() -> ExitCode {
    let args = AppArgs::parse();
    init_logging(args.verbose);

    let src = match std::fs::read_to_string(&args.input) {
        Ok(src) => src,
        Err(source) => {
            report(&FileErr { action: "read", path: args.input.clone(), source }, &args.input, None);
            return ExitCode::FAILURE;
        }
    };

    let image = match assemble_debug(&src) {
        Ok(image) => image,
        Err(e) => {
            report(&e, &args.input, Some(&src));
            return ExitCode::FAILURE;
        }
    };

    if args.dump {
        dump(&image);
    }

    let output = args.output.unwrap_or_else(|| args.input.with_extension("bin"));
    let written = match args.format {
        Format::Mem => std::fs::write(&output, MemFormat::serialize(&image)),
        Format::Bin => std::fs::write(&output, BinaryFormat::serialize(&image)),
    };
    if let Err(source) = written {
        report(&FileErr { action: "write", path: output, source }, &args.input, None);
        return ExitCode::FAILURE;
    }

    log::info!("wrote {} word(s) to {}", image.len(), output.display());
    ExitCode::SUCCESS
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    // RUST_LOG takes priority over -v
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_target(false)
        .format_timestamp(None)
        .init();
}

fn report(err: &dyn Error, path: &Path, src: Option<&str>) {
    ceprintln!("<red,bold>error</>: {}", err);
    if let Some(line) = err.line() {
        let raw = src
            .zip(line.checked_sub(1))
            .and_then(|(src, i)| src.lines().nth(i))
            .unwrap_or("");

        ceprintln!("     <blue>--></> <underline>{}:{}</>", path.display(), line);
        ceprintln!("      <blue>|</>");
        ceprintln!(" <blue>{:>4} |</> {}", line, raw);
        ceprintln!("      <blue>|</>");
    }
    if let Some(help) = err.help() {
        ceprintln!("<green,bold>help</>: {}", help);
    }
}

fn dump(image: &Image) {
    let sym = image.symbol_table();
    for (addr, word) in image.addr_iter() {
        let instr = SimInstr::decode(word)
            .map_or_else(|| format!(".fill {word}"), |i| i.to_string());
        let labels = sym
            .map(|s| s.rev_lookup_labels(addr).join(" "))
            .unwrap_or_default();

        cprintln!("<blue>{:>4}</>  {:04X}  {:<24}<green>{}</>", addr, word, instr, labels);
    }
}
