use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    nlweb_chat::cli::main()
}
