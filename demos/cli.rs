use rand_regen::{Regex, RngSource, DEFAULT_MAX_REPEAT};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let pattern = std::env::args().nth(1).expect("give me a regex pattern");
    let n = std::env::args()
        .nth(2)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(1);
    let regex = Regex::compile(&pattern, DEFAULT_MAX_REPEAT)?;
    let mut rng = RngSource(rand::rng());
    for _ in 0..n {
        let sample = regex.generate(&mut rng)?;
        println!("{}", String::from_utf8_lossy(sample.as_bytes()));
    }
    Ok(())
}
