use anyhow::Result;

fn main() -> Result<()> {
    let args = hostblock::args::parsed();
    hostblock::logging::init(args.verbosity);
    hostblock::run(&args)
}
