use super::Line;

pub fn render(lines: &[Line]) -> String {
    let mut out = String::new();
    for line in lines {
        match line {
            Line::Title(title) => {
                out.push_str(title);
                out.push('\n');
                out.push_str(&"=".repeat(title.chars().count()));
                out.push('\n');
            }
            Line::Meta(meta) => {
                out.push_str(meta);
                out.push('\n');
            }
            Line::Heading(heading) => {
                out.push('\n');
                out.push_str(heading);
                out.push('\n');
                out.push_str(&"-".repeat(heading.chars().count()));
                out.push('\n');
            }
            Line::Item { label, checked } => {
                out.push_str(if *checked { "[x] " } else { "[ ] " });
                out.push_str(label);
                out.push('\n');
            }
        }
    }
    out
}
