#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("Error parsing map at line {line}: {kind}")]
    Parse { line: usize, kind: String },
    #[error("Error parsing map: unexpected end of input")]
    Incomplete,
    #[error("Error opening map: {source}")]
    IOError {
        #[from]
        source: std::io::Error,
    },
}
