use anyhow::Result;
use reno_config::Config;

pub fn handle(config: &Config, text: &str, revealed: bool, json: bool) -> Result<()> {
    let sanitizer = super::sanitizer(config)?;
    let out = sanitizer.sanitize(text, !revealed);

    if json {
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("{}", out.text);
    if out.is_filtered {
        eprintln!();
        eprintln!("Redactions:");
        for info in &out.redactions {
            eprintln!("  {}: {}", info.category.as_str(), info.count);
        }
    }

    Ok(())
}

pub fn check(config: &Config, text: &str) -> Result<()> {
    let sanitizer = super::sanitizer(config)?;

    if sanitizer.contains_personal_info(text) {
        println!("⚠ Message contains personal information");
    } else {
        println!("✓ No personal information found");
    }

    Ok(())
}
