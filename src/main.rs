fn main() {
    if let Err(err) = osu_backup::cli::run() {
        println!("{:#}", err);
        std::process::exit(osu_backup::cli::commands::exit_code(&err));
    }
}
