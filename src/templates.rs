//! Server-rendered pages. Small enough that the pages are built as strings
//! here rather than through a template engine.

use crate::auth::dto::{FormErrors, LoginForm, SignupForm};
use crate::users::User;

/// Escape user-supplied text for safe interpolation into HTML.
fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!doctype html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title} - userhub</title>\n</head>\n<body>\n{body}\n</body>\n</html>\n"
    )
}

fn field_errors(errors: &FormErrors, field: &str) -> String {
    errors
        .for_field(field)
        .map(|msg| format!("<span class=\"error\">{}</span>", escape(msg)))
        .collect()
}

fn text_input(
    label: &str,
    name: &str,
    kind: &str,
    value: &str,
    errors: &FormErrors,
) -> String {
    format!(
        "<p><label for=\"{name}\">{label}</label><br>\
         <input type=\"{kind}\" id=\"{name}\" name=\"{name}\" value=\"{value}\">{errs}</p>",
        value = escape(value),
        errs = field_errors(errors, name),
    )
}

pub fn landing_page() -> String {
    page(
        "Welcome",
        "<h1>userhub</h1>\n\
         <p><a href=\"/signup\">Sign up</a> or <a href=\"/login\">log in</a>.</p>",
    )
}

pub fn login_page(form: &LoginForm, errors: &FormErrors) -> String {
    let body = format!(
        "<h1>Log in</h1>\n<form method=\"post\" action=\"/login\">\n{email}{password}\
         <p><button type=\"submit\">Log in</button></p>\n</form>\n\
         <p><a href=\"/signup\">Need an account? Sign up</a></p>",
        email = text_input("Email", "email", "email", &form.email, errors),
        // Passwords are never echoed back into the form.
        password = text_input("Password", "password", "password", "", errors),
    );
    page("Log in", &body)
}

pub fn signup_page(form: &SignupForm, errors: &FormErrors) -> String {
    let body = format!(
        "<h1>Sign up</h1>\n<form method=\"post\" action=\"/signup\">\n\
         {first_name}{last_name}{email}{password}\
         <p><button type=\"submit\">Sign up</button></p>\n</form>\n\
         <p><a href=\"/login\">Already registered? Log in</a></p>",
        first_name = text_input("First name", "first_name", "text", &form.first_name, errors),
        last_name = text_input("Last name", "last_name", "text", &form.last_name, errors),
        email = text_input("Email", "email", "email", &form.email, errors),
        password = text_input("Password", "password", "password", "", errors),
    );
    page("Sign up", &body)
}

pub fn profile_page(user: &User) -> String {
    let display_name = match (&user.first_name, &user.last_name) {
        (Some(first), Some(last)) => format!("{first} {last}"),
        (Some(first), None) => first.clone(),
        _ => user.username.clone().unwrap_or_else(|| user.email.clone()),
    };
    let body = format!(
        "<h1>Profile</h1>\n<p>Hello, {name}!</p>\n<p>Email: {email}</p>\n\
         <p><a href=\"/logout\">Log out</a></p>",
        name = escape(&display_name),
        email = escape(&user.email),
    );
    page("Profile", &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            username: None,
            email: "ada@example.com".into(),
            password_hash: Some("hash".into()),
            first_name: Some("Ada".into()),
            last_name: Some("Lovelace".into()),
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn escape_neutralizes_markup() {
        assert_eq!(
            escape("<script>alert('x')</script>"),
            "&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"
        );
        assert_eq!(escape("a & b \"c\""), "a &amp; b &quot;c&quot;");
    }

    #[test]
    fn login_page_shows_field_errors() {
        let mut errors = FormErrors::default();
        errors.add("email", "Incorrect Email");
        let html = login_page(&LoginForm::default(), &errors);
        assert!(html.contains("<span class=\"error\">Incorrect Email</span>"));
    }

    #[test]
    fn signup_page_keeps_entered_values_escaped() {
        let form = SignupForm {
            first_name: "<Ada>".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            password: "secretpass".into(),
        };
        let html = signup_page(&form, &FormErrors::default());
        assert!(html.contains("value=\"&lt;Ada&gt;\""));
        assert!(html.contains("value=\"ada@example.com\""));
        // The password input is always rendered empty.
        assert!(!html.contains("secretpass"));
    }

    #[test]
    fn profile_page_greets_by_name() {
        let html = profile_page(&user());
        assert!(html.contains("Hello, Ada Lovelace!"));
        assert!(html.contains("ada@example.com"));
        assert!(html.contains("/logout"));
    }

    #[test]
    fn profile_page_falls_back_to_username_then_email() {
        let mut u = user();
        u.first_name = None;
        u.last_name = None;
        u.username = Some("ada".into());
        assert!(profile_page(&u).contains("Hello, ada!"));

        u.username = None;
        assert!(profile_page(&u).contains("Hello, ada@example.com!"));
    }
}
