fn main() {
    #[cfg(feature = "cli")]
    hdiffz::cli::run();

    #[cfg(not(feature = "cli"))]
    {
        eprintln!("hdiffz: CLI not enabled. Rebuild with `--features cli`.");
        std::process::exit(1);
    }
}
