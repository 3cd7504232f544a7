//! Server-rendered HTML.

use crate::models::{TaskStatus, User};
use crate::views::projection::TaskProjection;

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
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

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
</head>
<body>
{body}
</body>
</html>
"#,
        title = escape(title),
        body = body,
    )
}

fn banner(class: &str, message: &str) -> String {
    format!(r#"<div class="{}" role="status">{}</div>"#, class, escape(message))
}

fn disabled(flag: bool) -> &'static str {
    if flag { " disabled" } else { "" }
}

pub fn login_page(error: Option<&str>, magic_sent: bool) -> String {
    let mut body = String::from("<main class=\"auth\">\n<h1>Welcome back</h1>\n<p>Sign in to your account</p>\n");

    if let Some(error) = error {
        body.push_str(&banner("error", error));
    }
    if magic_sent {
        body.push_str(&banner(
            "success",
            "Magic link sent! Check your email and click the link to sign in.",
        ));
    }

    body.push_str(
        r#"
<section>
<h2>Password</h2>
<form method="post" action="/login">
<label>Email <input name="email" type="email" required></label>
<label>Password <input name="password" type="password" required></label>
<button type="submit">Sign in</button>
</form>
</section>
<section>
<h2>Magic link</h2>
<form method="post" action="/login/magic-link">
<label>Email <input name="email" type="email" required></label>
<button type="submit">Send magic link</button>
</form>
</section>
<p>No account yet? <a href="/register">Sign up</a></p>
</main>"#,
    );

    layout("Sign in", &body)
}

pub fn register_page(error: Option<&str>, success: bool) -> String {
    let mut body = String::from(
        "<main class=\"auth\">\n<h1>Create your account</h1>\n<p>Sign up to start managing your tasks</p>\n",
    );

    if let Some(error) = error {
        body.push_str(&banner("error", error));
    }
    if success {
        body.push_str(&banner(
            "success",
            "Account created successfully! Please check your email for a confirmation link.",
        ));
    }

    body.push_str(
        r#"
<form method="post" action="/register">
<label>Email <input name="email" type="email" required></label>
<label>Password <input name="password" type="password" required></label>
<button type="submit">Sign Up</button>
</form>
<p>Already have an account? <a href="/login">Log in</a></p>
</main>"#,
    );

    layout("Sign up", &body)
}

pub fn home_page(user: &User, projection: &TaskProjection) -> String {
    let pending = projection.pending();
    let mut body = format!(
        r#"<nav>
<h1>Tasks</h1>
<span class="user">{email}</span>
<form method="post" action="/logout"><button type="submit">Sign out</button></form>
</nav>
<main>
<form method="post" action="/tasks" class="add-task">
<input name="title" placeholder="What needs to be done?" required{add_disabled}>
<button type="submit"{add_disabled}>{add_label}</button>
</form>
<section class="stats">
"#,
        email = escape(user.email.as_deref().unwrap_or("")),
        add_disabled = disabled(pending.adding),
        add_label = if pending.adding { "Adding..." } else { "Add Task" },
    );

    for status in TaskStatus::ALL {
        body.push_str(&format!(
            "<div class=\"stat {}\"><span>{}</span> <strong>{}</strong></div>\n",
            status,
            status.label(),
            projection.count(status)
        ));
    }
    body.push_str("</section>\n");

    if projection.tasks().is_empty() {
        body.push_str(
            "<section class=\"empty\"><h3>No tasks yet</h3><p>Add your first task above to get started.</p></section>\n",
        );
    } else {
        body.push_str("<ul class=\"tasks\">\n");
        for task in projection.tasks() {
            let id = urlencoding::encode(&task.id);
            let mut options = String::new();
            for status in TaskStatus::ALL {
                let selected = if status == task.status { " selected" } else { "" };
                options.push_str(&format!(
                    "<option value=\"{}\"{}>{}</option>",
                    status,
                    selected,
                    status.label()
                ));
            }

            body.push_str(&format!(
                r#"<li class="task {status}">
<p class="title">{title}</p>
<p class="date">{date}</p>
<form method="post" action="/tasks/{id}/status"><select name="status"{disabled}>{options}</select><button type="submit"{disabled}>Update</button></form>
<form method="post" action="/tasks/{id}/delete"><button type="submit" title="Delete task"{disabled}>Delete</button></form>
</li>
"#,
                status = task.status,
                title = escape(&task.title),
                date = task.created_at.format("%b %-d, %Y"),
                id = escape(&id),
                disabled = disabled(pending.updating || TaskProjection::is_temporary(task)),
                options = options,
            ));
        }
        body.push_str("</ul>\n");
    }
    body.push_str("</main>");

    layout("Tasks", &body)
}

pub fn error_page(kind: Option<&str>, error: Option<&str>) -> String {
    let (title, description, action) = match kind {
        Some("auth_error") => (
            "Authentication Error",
            error.unwrap_or(
                "There was a problem with your authentication. This could be due to an expired or invalid link.",
            ),
            "Try logging in again",
        ),
        Some("task_error") => (
            "Task update failed",
            error.unwrap_or("The task could not be saved. Please try again."),
            "Back to your tasks",
        ),
        _ => (
            "Something went wrong",
            "An unexpected error occurred. Please try again.",
            "Go back to login",
        ),
    };
    let href = if kind == Some("task_error") { "/" } else { "/login" };

    let body = format!(
        r#"<main class="error">
<h1>{}</h1>
<p>{}</p>
<a href="{}">{}</a>
</main>"#,
        escape(title),
        escape(description),
        href,
        escape(action),
    );

    layout(title, &body)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::models::{Task, TaskPatch};
    use crate::views::projection::Mutation;

    fn user() -> User {
        User {
            id: "u1".to_string(),
            email: Some("ada@example.com".to_string()),
        }
    }

    #[test]
    fn escape_handles_markup() {
        assert_eq!(escape("<b>\"Tom\" & 'Jerry'</b>"), "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;");
    }

    #[test]
    fn home_page_escapes_titles_and_counts_statuses() {
        let projection = TaskProjection::new(vec![
            Task {
                id: "t1".to_string(),
                title: "<script>alert(1)</script>".to_string(),
                status: TaskStatus::Doing,
                created_at: Utc::now(),
                owner: "u1".to_string(),
            },
        ]);
        let html = home_page(&user(), &projection);

        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("ada@example.com"));
        assert!(html.contains("<span>Doing</span> <strong>1</strong>"));
        assert!(html.contains("action=\"/tasks/t1/status\""));
    }

    #[test]
    fn pending_flags_disable_controls() {
        let mut projection = TaskProjection::default();
        projection.apply(Mutation::Add(TaskPatch::title("Buy milk")));
        projection.set_adding(true);
        let html = home_page(&user(), &projection);

        assert!(html.contains("Adding..."));
        assert!(html.contains("required disabled"));
    }

    #[test]
    fn empty_list_shows_placeholder() {
        let html = home_page(&user(), &TaskProjection::default());
        assert!(html.contains("No tasks yet"));
    }

    #[test]
    fn login_page_shows_error_and_magic_link_banner() {
        let html = login_page(Some("Invalid login credentials"), true);
        assert!(html.contains("Invalid login credentials"));
        assert!(html.contains("Magic link sent!"));
    }
}
