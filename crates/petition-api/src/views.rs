//! Inline HTML for the three pages. Signature fields are escaped on the way
//! into the store and are written out as-is; everything else is escaped here.

use std::fmt::Write;

use axum::response::Html;
use petition_types::PAGE_SIZE;
use petition_types::models::{Signature, User};

use crate::validation::escape;

const TITLE: &str = "Undirskriftarlisti";

/// One page of the signature list.
pub struct Listing {
    pub signatures: Vec<Signature>,
    pub total: i64,
    pub page: i64,
}

impl Listing {
    fn has_next(&self) -> bool {
        (self.page + 1) * PAGE_SIZE < self.total
    }
}

pub fn index(listing: &Listing, errors: &[String], user: Option<&User>) -> Html<String> {
    let mut body = String::new();

    if let Some(user) = user {
        let _ = write!(
            body,
            r#"<p>Innskráður sem {} · <a href="/admin">stjórnborð</a> · <a href="/logout">útskrá</a></p>"#,
            escape(&user.username)
        );
    }

    body.push_str(&error_list(errors));
    body.push_str(SIGNATURE_FORM);
    body.push_str(&signature_table(listing, false));
    body.push_str(&pager(listing, ""));

    if user.is_none() {
        body.push_str(r#"<p><a href="/login">Innskráning</a></p>"#);
    }

    layout(TITLE, &body)
}

pub fn admin(listing: &Listing, errors: &[String], user: &User) -> Html<String> {
    let mut body = String::new();
    let _ = write!(
        body,
        r#"<p>Innskráður sem {} · <a href="/">forsíða</a> · <a href="/logout">útskrá</a></p>"#,
        escape(&user.username)
    );
    body.push_str(&error_list(errors));
    body.push_str(&signature_table(listing, true));
    body.push_str(&pager(listing, "/admin"));

    layout(&format!("{TITLE} - Admin"), &body)
}

pub fn login(message: &str) -> Html<String> {
    let mut body = String::from(
        r#"<form method="post" action="/login" autocomplete="off">
  <label>Notendanafn: <input type="text" name="username"></label>
  <label>Lykilorð: <input type="password" name="password"></label>
  <button>Innskrá</button>
</form>
"#,
    );
    let _ = write!(body, "<p>{}</p>", escape(message));

    layout(&format!("{TITLE} - Innskráning"), &body)
}

const SIGNATURE_FORM: &str = r#"<form method="post" action="/">
  <label>Nafn: <input type="text" name="name" maxlength="128"></label>
  <label>Kennitala: <input type="text" name="nationalId" placeholder="000000-0000"></label>
  <label>Athugasemd: <textarea name="text"></textarea></label>
  <label><input type="checkbox" name="check"> Ekki birta nafn á lista</label>
  <button>Skrifa undir</button>
</form>
"#;

fn layout(title: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!doctype html>\n<html lang=\"is\">\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n</head>\n<body>\n<h1>{title}</h1>\n{body}\n</body>\n</html>\n",
        title = escape(title),
    ))
}

fn error_list(errors: &[String]) -> String {
    if errors.is_empty() {
        return String::new();
    }

    let mut out = String::from("<ul class=\"errors\">\n");
    for message in errors {
        let _ = writeln!(out, "  <li>{}</li>", escape(message));
    }
    out.push_str("</ul>\n");
    out
}

fn signature_table(listing: &Listing, with_delete: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "<p>Fjöldi undirskrifta: {}</p>", listing.total);

    if listing.signatures.is_empty() {
        out.push_str("<p>Engar undirskriftir.</p>\n");
        return out;
    }

    out.push_str("<table>\n  <tr><th>Dags</th><th>Nafn</th><th>Athugasemd</th>");
    if with_delete {
        out.push_str("<th>Eyða</th>");
    }
    out.push_str("</tr>\n");

    for signature in &listing.signatures {
        let name = if signature.anonymous || signature.name.is_empty() {
            "Nafnlaus"
        } else {
            signature.name.as_str()
        };
        let _ = write!(
            out,
            "  <tr><td>{}</td><td>{}</td><td>{}</td>",
            signature.signed.format("%d.%m.%Y"),
            name,
            signature.comment
        );
        if with_delete {
            let _ = write!(
                out,
                r#"<td><form method="post" action="/delete/{}"><button>Eyða</button></form></td>"#,
                signature.id
            );
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</table>\n");
    out
}

/// Previous/next links. Page 0 always lives at the bare prefix.
fn pager(listing: &Listing, prefix: &str) -> String {
    let href = |page: i64| {
        if page == 0 {
            if prefix.is_empty() { "/".to_string() } else { prefix.to_string() }
        } else {
            format!("{prefix}/{page}")
        }
    };

    let mut links = Vec::new();
    if listing.page > 0 {
        links.push(format!(r#"<a href="{}">Fyrri síða</a>"#, href(listing.page - 1)));
    }
    if listing.has_next() {
        links.push(format!(r#"<a href="{}">Næsta síða</a>"#, href(listing.page + 1)));
    }

    if links.is_empty() {
        String::new()
    } else {
        format!("<p class=\"pager\">Síða {} {}</p>\n", listing.page + 1, links.join(" "))
    }
}
