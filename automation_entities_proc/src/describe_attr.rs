// SPDX-License-Identifier: MIT OR Apache-2.0
use proc_macro::{Delimiter, Group, Ident, Literal, Punct, Spacing, Span, TokenStream, TokenTree};

/// How the expansion reaches `&Self` from the receiver.
fn receiver_expr(tokens: &[TokenTree]) -> Option<&'static str> {
    let mut reference = false;
    let mut i = 0;
    while i < tokens.len() {
        match &tokens[i] {
            TokenTree::Punct(p) if p.as_char() == '&' => reference = true,
            // lifetime: `'` followed by its name
            TokenTree::Punct(p) if p.as_char() == '\'' => i += 1,
            TokenTree::Ident(ident) if ident.to_string() == "mut" => {}
            TokenTree::Ident(ident) if ident.to_string() == "self" => {
                let typed = matches!(tokens.get(i + 1), Some(t) if is_punct(t, ':'));
                return Some(if typed {
                    "&*self"
                } else if reference {
                    "self"
                } else {
                    "&self"
                });
            }
            _ => return None,
        }
        i += 1;
    }
    None
}

enum Param {
    Receiver(&'static str),
    Named(String),
    Skipped,
}

fn classify_param(tokens: &[TokenTree]) -> Param {
    // outer attributes
    let mut start = 0;
    while start + 1 < tokens.len()
        && is_punct(&tokens[start], '#')
        && matches!(&tokens[start + 1], TokenTree::Group(g) if g.delimiter() == Delimiter::Bracket)
    {
        start += 2;
    }
    let tokens = &tokens[start..];

    if let Some(expr) = receiver_expr(tokens) {
        return Param::Receiver(expr);
    }

    let pattern_len = tokens
        .iter()
        .position(|t| matches!(t, TokenTree::Punct(p) if p.as_char() == ':' && p.spacing() == Spacing::Alone))
        .unwrap_or(tokens.len());
    match &tokens[..pattern_len] {
        [TokenTree::Ident(name)] if name.to_string() != "_" => Param::Named(name.to_string()),
        [TokenTree::Ident(m), TokenTree::Ident(name)] if m.to_string() == "mut" => {
            Param::Named(name.to_string())
        }
        _ => Param::Skipped,
    }
}

/// Splits a parameter list on its top-level commas.
fn split_params(stream: TokenStream) -> Vec<Vec<TokenTree>> {
    let mut params = Vec::new();
    let mut current = Vec::new();
    let mut angle_depth = 0usize;
    let mut after_arrow_minus = false;
    for token in stream {
        let mut split = false;
        if let TokenTree::Punct(p) = &token {
            match p.as_char() {
                '<' => angle_depth += 1,
                '>' if !after_arrow_minus => angle_depth = angle_depth.saturating_sub(1),
                ',' if angle_depth == 0 => split = true,
                _ => {}
            }
        }
        after_arrow_minus =
            matches!(&token, TokenTree::Punct(p) if p.as_char() == '-' && p.spacing() == Spacing::Joint);
        if split {
            params.push(std::mem::take(&mut current));
        } else {
            current.push(token);
        }
    }
    if !current.is_empty() {
        params.push(current);
    }
    params
}

fn is_punct(token: &TokenTree, ch: char) -> bool {
    matches!(token, TokenTree::Punct(p) if p.as_char() == ch)
}

fn is_ident(token: &TokenTree, name: &str) -> bool {
    matches!(token, TokenTree::Ident(ident) if ident.to_string() == name)
}

fn is_arrow(tokens: &[TokenTree], i: usize) -> bool {
    matches!(&tokens[i..], [TokenTree::Punct(minus), TokenTree::Punct(gt), ..]
        if minus.as_char() == '-' && minus.spacing() == Spacing::Joint && gt.as_char() == '>')
}

/// `compile_error!("message");`
fn error(message: &str) -> TokenStream {
    let tokens: Vec<TokenTree> = vec![
        Ident::new("compile_error", Span::call_site()).into(),
        Punct::new('!', Spacing::Alone).into(),
        Group::new(
            Delimiter::Parenthesis,
            TokenTree::from(Literal::string(message)).into(),
        )
        .into(),
        Punct::new(';', Spacing::Alone).into(),
    ];
    tokens.into_iter().collect()
}

/// Implementation of the `#[describe]` attribute macro.
///
/// Replaces the method body with a call to `describe_call` that runs the
/// original body in a closure.
pub fn describe_attr_impl(attr: TokenStream, item: TokenStream) -> TokenStream {
    if !attr.is_empty() {
        return error("#[describe] takes no arguments");
    }
    let mut tokens: Vec<TokenTree> = item.into_iter().collect();

    let fn_idx = match tokens.iter().position(|t| is_ident(t, "fn")) {
        Some(idx) => idx,
        None => return error("#[describe] can only be applied to methods"),
    };
    if tokens[..fn_idx].iter().any(|t| is_ident(t, "async")) {
        return error("#[describe] does not support async methods");
    }
    let fn_name = match tokens.get(fn_idx + 1) {
        Some(TokenTree::Ident(name)) => name.to_string(),
        _ => return error("#[describe] expected a method name"),
    };
    let display_name = fn_name.strip_prefix("r#").unwrap_or(&fn_name).to_string();

    // skip generics
    let mut i = fn_idx + 2;
    if tokens.get(i).is_some_and(|t| is_punct(t, '<')) {
        let mut depth = 0usize;
        while i < tokens.len() {
            if is_arrow(&tokens, i) {
                i += 2;
                continue;
            }
            if is_punct(&tokens[i], '<') {
                depth += 1;
            } else if is_punct(&tokens[i], '>') {
                depth -= 1;
                if depth == 0 {
                    i += 1;
                    break;
                }
            }
            i += 1;
        }
    }

    let params = match tokens.get(i) {
        Some(TokenTree::Group(g)) if g.delimiter() == Delimiter::Parenthesis => g.stream(),
        _ => return error("#[describe] expected a parameter list"),
    };
    i += 1;

    let mut return_type = String::from("()");
    if i + 1 < tokens.len() && is_arrow(&tokens, i) {
        let ret_start = i + 2;
        let mut ret_end = ret_start;
        while ret_end < tokens.len()
            && !is_ident(&tokens[ret_end], "where")
            && !matches!(&tokens[ret_end], TokenTree::Group(g) if g.delimiter() == Delimiter::Brace)
        {
            ret_end += 1;
        }
        let ret_tokens = &tokens[ret_start..ret_end];
        if ret_tokens.iter().any(|t| is_ident(t, "impl")) {
            return error("#[describe] does not support `impl Trait` return types");
        }
        return_type = ret_tokens.iter().cloned().collect::<TokenStream>().to_string();
    }

    let body_idx = tokens.len() - 1;
    let original_body = match &tokens[body_idx] {
        TokenTree::Group(g) if g.delimiter() == Delimiter::Brace => g.stream(),
        _ => return error("#[describe] requires a method with a body"),
    };

    let mut receiver = None;
    let mut args = String::new();
    for param in split_params(params) {
        match classify_param(&param) {
            Param::Receiver(expr) => receiver = Some(expr),
            Param::Named(name) => args.push_str(&format!(".arg(&{name})")),
            Param::Skipped => {}
        }
    }
    let receiver = match receiver {
        Some(receiver) => receiver,
        None => return error("#[describe] can only be applied to methods that take `self`"),
    };

    let new_body_src = format!(
        r#"{{
            let __ae_context = automation_entities::hidden::entity_context::<Self>({receiver});
            let __ae_args = automation_entities::hidden::Args::new(){args}.render();
            automation_entities::hidden::describe_call(
                &__ae_context,
                &automation_entities::hidden::qualname::<Self>("{display_name}"),
                __ae_args,
                || -> {return_type} {{ {original_body} }},
            )
        }}"#
    );

    let new_body = match new_body_src.parse::<TokenStream>() {
        Ok(stream) => stream.into_iter().next(),
        Err(_) => None,
    };
    match new_body {
        Some(group) => tokens[body_idx] = group,
        None => return error("#[describe] could not rewrite the method body"),
    }

    tokens.into_iter().collect()
}
