use anyhow::Context as _;
use clap::Parser;
use slrgen_demo_asm::{grammar::AsmParser, instruction::Instruction, lines};
use std::{fs::File, io::BufReader, path::PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The path of the assembly source file.
    source: PathBuf,

    /// Print the instruction grammar before assembling.
    #[arg(long)]
    dump_grammar: bool,

    /// Print the compiled action table before assembling.
    #[arg(long)]
    dump_table: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::trace!("CLI args = {:?}", args);

    let parser = AsmParser::new().context("failed to build the instruction parser")?;
    if args.dump_grammar {
        println!("{}", parser.grammar());
    }
    if args.dump_table {
        println!("{}", parser.table().display());
    }

    let file_name = args.source.display().to_string();
    let file = File::open(&args.source)
        .with_context(|| format!("failed to open the source file `{}'", file_name))?;

    let mut count = 0;
    for line in lines::code_lines(BufReader::new(file), &file_name) {
        let line = line.with_context(|| format!("failed to read `{}'", file_name))?;
        let location = line.location().to_string();

        let tree = parser
            .parse_line(line.code())
            .with_context(|| format!("{}: syntax error", location))?;
        print!("{}", parser.table().display_node(&tree));

        let instruction = Instruction::lower(&parser, &tree)
            .with_context(|| format!("{}: invalid instruction", location))?;
        if !instruction.matches_format() {
            println!(
                "[warning] {}: `{}' expects {} operands, found {}",
                location, instruction.operation, instruction.opcode.format, instruction.shape
            );
        }
        println!("{}: {}", location, instruction);
        count += 1;
    }

    tracing::debug!(count, "assembled");
    Ok(())
}
