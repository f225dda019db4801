use anyhow::Result;
use bakery::{AttrValue, Cookie, ResponseBuffer};

fn main() -> Result<()> {
    env_logger::init();

    let response = ResponseBuffer::new();

    let mut cookie = Cookie::with_attributes(
        response.clone(),
        [
            ("name", AttrValue::from("session")),
            ("value", AttrValue::from(vec!["abc123", "def456"])),
            ("path", AttrValue::from("/")),
            ("secure", AttrValue::from(true)),
        ],
    )?;
    cookie.set_expires("+1h");
    cookie.bake()?;

    for value in response.header_values("set-cookie") {
        println!("Set-Cookie: {}", value);
    }

    Ok(())
}
