//! Catch-all view for unmatched paths

pub fn render(path: &str) -> String {
    format!("404\nPage Not Found\n\nNo page exists at {}\n", path)
}
