//! The `gurukul init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("gurukul.toml").exists() {
        println!("gurukul.toml already exists, skipping.");
    } else {
        std::fs::write("gurukul.toml", SAMPLE_CONFIG)?;
        println!("Created gurukul.toml");
    }

    println!("\nNext steps:");
    println!("  1. Pick a store in gurukul.toml (a local file works out of the box)");
    println!("  2. Set GURUKUL_GEMINI_KEY to enable grading and content generation");
    println!("  3. Run: gurukul enroll --student s1 --name \"Asha\" --class c1");
    println!("  4. Run: gurukul record --student s1 --class c1 --completed --grade 85");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# gurukul configuration

[store]
type = "file"
path = ".gurukul/store.json"

# [store]
# type = "firestore"
# project_id = "my-lms"
# api_key = "${FIREBASE_API_KEY}"

[generator]
type = "gemini"
api_key = "${GEMINI_API_KEY}"
model = "gemini-pro"

[analytics]
active_window_days = 7
assumed_assignments = 10
"#;
