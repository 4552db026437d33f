fn main() {
    match nodekeep::run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            eprintln!("{}", nodekeep::format_error(&err));
            std::process::exit(1);
        }
    }
}
