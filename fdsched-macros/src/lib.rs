//! Attribute macros for the fdsched scheduler.
//!
//! `#[fdsched::test]` turns an `async fn` into a `#[test]` whose body runs
//! on a freshly built scheduler via `block_on`.

mod utils;

use proc_macro::{Delimiter, Group, TokenStream, TokenTree};

#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
    let max_fd = match utils::parse_max_fd(attr) {
        Ok(max_fd) => max_fd,
        Err(msg) => return compile_error(&msg),
    };

    let mut tokens = item.into_iter().collect::<Vec<_>>();

    if let Some(pos) = tokens
        .iter()
        .position(|t| matches!(t, TokenTree::Ident(id) if id.to_string() == "async"))
    {
        tokens.remove(pos);
    }

    let block_pos = tokens
        .iter()
        .rposition(|t| matches!(t, TokenTree::Group(g) if g.delimiter() == Delimiter::Brace));

    let Some(pos) = block_pos else {
        return compile_error("#[fdsched::test] expects a function with a body");
    };

    let block = match &tokens[pos] {
        TokenTree::Group(g) => g.stream().to_string(),
        _ => unreachable!(),
    };

    let mut builder = String::from("::fdsched::SchedulerBuilder::new()");

    if let Some(n) = max_fd {
        builder.push_str(&format!(".max_fd({n})"));
    }

    builder.push_str(".build()");

    let new_block = format!(
        "{{
        let scheduler = {builder};
        scheduler
            .block_on(async move {{ {block} }})
            .expect(\"scheduler stopped before the test body finished\")
    }}"
    );

    let body = match new_block.parse() {
        Ok(body) => body,
        Err(err) => return compile_error(&format!("fdsched::test macro error: {err}")),
    };

    tokens[pos] = TokenTree::Group(Group::new(Delimiter::Brace, body));

    let test_attr: TokenStream = "#[test]".parse().unwrap();
    let mut result: Vec<TokenTree> = test_attr.into_iter().collect();
    result.extend(tokens);

    result.into_iter().collect()
}

fn compile_error(msg: &str) -> TokenStream {
    format!("compile_error!({msg:?});").parse().unwrap()
}
