fn main() -> anyhow::Result<()> {
    segroute::cli::run_cli()
}
