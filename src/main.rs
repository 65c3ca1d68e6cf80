use std::error::Error;

use iching::{ECLevel, IChingBuilder, IChingReader};

fn main() -> Result<(), Box<dyn Error>> {
    let payload = "HELLO WORLD";

    let code = IChingBuilder::new(payload).ec_level(ECLevel::Medium).build()?;
    println!("Generated IChing code {{ version: {}, size: {} }}", code.version(), code.size());

    let img = code.to_image(1250)?;
    img.save("iching.png")?;
    println!("Saved iching.png");

    let decoded = IChingReader::read(&img)?;
    println!("Decoded back: {}", decoded.payload);

    Ok(())
}
