use thiserror::Error;

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("worksheet grid has {rows} row(s); expected a title row and a header row")]
    MalformedInput { rows: usize },

    #[error("worksheet CSV error: {source}")]
    Csv {
        #[from]
        source: csv::Error,
    },
}
