//! CLI Exit Code Registry
//!
//! Single source of truth for `cartcheck` exit codes. Scripts rely on them.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success, every checklist line matched                |
//! | 1    | Reconciliation found missing or extra entries        |
//! | 2    | Usage error (bad args, invalid settings)             |
//! | 3    | IO error (cannot read input, cannot write output)    |
//! | 4    | Parse error (malformed CSV or settings file)         |
//! | 20   | Capture device could not be acquired                 |

/// Success.
pub const EXIT_SUCCESS: u8 = 0;

/// Missing or extra entries found. Like `diff(1)`, 1 means "differs".
pub const EXIT_MISMATCH: u8 = 1;

/// Bad arguments or settings values.
pub const EXIT_USAGE: u8 = 2;

/// Reading or writing a file failed.
pub const EXIT_IO: u8 = 3;

/// Malformed CSV input or settings file.
pub const EXIT_PARSE: u8 = 4;

/// Camera refused or unavailable.
pub const EXIT_CAPTURE: u8 = 20;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct() {
        let codes = [EXIT_SUCCESS, EXIT_MISMATCH, EXIT_USAGE, EXIT_IO, EXIT_PARSE, EXIT_CAPTURE];
        for (i, a) in codes.iter().enumerate() {
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
