/// Heuristic guess at whether a JS/CSS body has been minified.
///
/// Short snippets always count as minified. Otherwise the code is minified when
/// it has almost no newlines and little whitespace, or when its non-blank lines
/// average more than 500 characters.
pub fn is_minified(code: &str) -> bool {
    let length = code.chars().count();
    if length < 50 {
        return true;
    }

    let newlines = code.chars().filter(|c| *c == '\n').count();
    let whitespace = code.chars().filter(|c| c.is_whitespace()).count();
    let newline_ratio = newlines as f64 / length as f64;
    let whitespace_ratio = whitespace as f64 / length as f64;

    let lines: Vec<usize> = code
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.chars().count())
        .collect();
    let average_line_length = if lines.is_empty() {
        0.0
    } else {
        lines.iter().sum::<usize>() as f64 / lines.len() as f64
    };

    (newline_ratio < 0.01 && whitespace_ratio < 0.15) || average_line_length > 500.0
}
