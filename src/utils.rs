//! Small helpers shared by the binaries.

use itertools::Itertools;
use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::{error::Result, payline::Matrix};

/// Renders a column-major matrix row by row, symbols padded to a common width.
pub fn format_matrix(matrix: &Matrix) -> String {
    let rows = matrix.iter().map(Vec::len).max().unwrap_or(0);
    (0..rows)
        .map(|row| {
            matrix
                .iter()
                .map(|column| match column.get(row) {
                    Some(symbol) => format!("{:^9}", symbol),
                    None => format!("{:^9}", ""),
                })
                .join("|")
        })
        .join("\n")
}

/// Sends `message` as one line of JSON and flushes.
pub async fn write_message<W, T>(stream: &mut W, message: &T) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let mut line = serde_json::to_string(message)?;
    line.push('\n');
    stream.write_all(line.as_bytes()).await?;
    stream.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::Symbol::*;

    #[test]
    fn matrix_is_printed_by_rows() {
        let matrix = vec![vec![Seven, Bell], vec![Bar, Wild]];
        assert_eq!(
            format_matrix(&matrix),
            "  SEVEN  |   BAR   \n  BELL   |  WILD   "
        );
    }

    #[tokio::test]
    async fn messages_are_newline_terminated_json() {
        let mut buffer: Vec<u8> = vec![];
        write_message(&mut buffer, &vec![1, 2, 3]).await.unwrap();
        assert_eq!(buffer, b"[1,2,3]\n");
    }
}
