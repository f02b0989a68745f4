pub const GEOLOCATION: &str = include_str!("../data/prompts/geolocation.txt");
pub const CONTEXT_SECTION: &str = include_str!("../data/prompts/context_section.txt");
pub const GUESS_SECTION: &str = include_str!("../data/prompts/guess_section.txt");
pub const CLOSING: &str = include_str!("../data/prompts/closing.txt");

/// Replace `{{key}}` placeholders in a template string.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{{{}}}}}", key), value);
    }
    result
}

/// Full geolocation instruction: fixed prompt, optional context and guess
/// sections, closing reminder. Blank sections are skipped.
pub fn geolocation_prompt(context: Option<&str>, location_guess: Option<&str>) -> String {
    let mut sections = vec![GEOLOCATION.trim_end().to_string()];

    if let Some(context) = context.map(str::trim).filter(|c| !c.is_empty()) {
        sections.push(render(CONTEXT_SECTION, &[("context", context)]).trim_end().to_string());
    }
    if let Some(guess) = location_guess.map(str::trim).filter(|g| !g.is_empty()) {
        sections.push(render(GUESS_SECTION, &[("guess", guess)]).trim_end().to_string());
    }
    sections.push(CLOSING.trim_end().to_string());

    sections.join("\n\n")
}
