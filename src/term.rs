//! ANSI styling shared by the command-line binaries.

pub fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}

pub fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}

pub fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

pub fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_and_resets() {
        assert_eq!(green("ok"), "\x1b[32mok\x1b[0m");
        assert!(red("x").ends_with("\x1b[0m"));
        assert!(bold("b").starts_with("\x1b[1m"));
        assert!(dim("d").contains('d'));
    }
}
