use proc_macro::{TokenStream, TokenTree};

/// Splits a `TokenStream` into comma-separated arguments.
///
/// Each argument is returned as a `Vec<TokenTree>`.
/// Commas at the top level are used as separators.
pub(crate) fn split_args(input: TokenStream) -> Vec<Vec<TokenTree>> {
    let mut args = Vec::new();
    let mut current = Vec::new();

    for token in input {
        match &token {
            TokenTree::Punct(p) if p.as_char() == ',' => {
                if !current.is_empty() {
                    args.push(current);
                    current = Vec::new();
                }
            }
            _ => current.push(token),
        }
    }

    if !current.is_empty() {
        args.push(current);
    }

    args
}

/// Parses the attribute arguments of `#[fdsched::test]`.
///
/// The only accepted argument is `max_fd = <integer>`. Returns `None`
/// when the attribute is empty.
pub(crate) fn parse_max_fd(attr: TokenStream) -> Result<Option<usize>, String> {
    let mut max_fd = None;

    for arg in split_args(attr) {
        match arg.as_slice() {
            [TokenTree::Ident(key), TokenTree::Punct(eq), TokenTree::Literal(value)]
                if key.to_string() == "max_fd" && eq.as_char() == '=' =>
            {
                let value = value.to_string().replace('_', "");

                match value.parse::<usize>() {
                    Ok(n) if n > 0 => max_fd = Some(n),
                    _ => return Err(format!("max_fd must be a positive integer, got `{value}`")),
                }
            }
            _ => {
                let text = arg.iter().map(|t| t.to_string()).collect::<Vec<_>>().join(" ");
                return Err(format!("unsupported argument `{text}`, expected `max_fd = N`"));
            }
        }
    }

    Ok(max_fd)
}
