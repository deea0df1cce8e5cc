//! HTML rendering for the browser pages.
//!
//! Markup is assembled from small helpers; every piece of user-supplied text
//! goes through [`escape`] before it lands in a page.

use actix_web::{http::StatusCode, HttpResponse};

use crate::models::{Task, TaskPriority, TaskStatus, User};

pub const NOT_SIGNED_IN: &str = "You are not signed in. Please log in or register.";

/// Escapes text for use in element content and quoted attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn html(status: StatusCode, body: String) -> HttpResponse {
    HttpResponse::build(status)
        .content_type("text/html; charset=utf-8")
        .body(body)
}

/// Wraps `content` in the common layout: navigation for `user` and, for
/// signed-in users, the tasks due within a day.
pub fn layout(title: &str, user: Option<&User>, near_deadline: &[Task], content: &str) -> String {
    let mut page = String::new();
    page.push_str(&format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{}</title></head>\n<body>\n",
        escape(title)
    ));

    page.push_str("<nav>");
    match user {
        Some(user) => {
            page.push_str(&format!(
                "<a href=\"/\">Home</a> <a href=\"/tasks\">Tasks</a> \
                 <a href=\"/tasks/create\">New task</a> <a href=\"/search\">Search</a> \
                 <a href=\"/update_password\">Password</a> <a href=\"/logout\">Log out</a> \
                 <span class=\"user\">{}</span>",
                escape(&user.username)
            ));
        }
        None => page.push_str("<a href=\"/\">Home</a> <a href=\"/login\">Log in</a> <a href=\"/register\">Register</a>"),
    }
    page.push_str("</nav>\n");

    if user.is_some() && !near_deadline.is_empty() {
        page.push_str("<aside class=\"near-deadline\"><h2>Due within a day</h2><ul>");
        for task in near_deadline {
            page.push_str(&format!(
                "<li><a href=\"/tasks/{}\">{}</a> {}</li>",
                task.id,
                escape(&task.title),
                format_deadline(task)
            ));
        }
        page.push_str("</ul></aside>\n");
    }

    page.push_str(&format!(
        "<main>\n<h1>{}</h1>\n{}\n</main>\n</body>\n</html>\n",
        escape(title),
        content
    ));
    page
}

pub fn errors(messages: &[String]) -> String {
    if messages.is_empty() {
        return String::new();
    }
    let mut out = String::from("<ul class=\"errors\">");
    for message in messages {
        out.push_str(&format!("<li>{}</li>", escape(message)));
    }
    out.push_str("</ul>");
    out
}

pub fn task_table(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return "<p>No tasks.</p>".to_string();
    }
    let mut out = String::from(
        "<table class=\"tasks\"><tr><th>Title</th><th>Status</th><th>Priority</th><th>Deadline</th></tr>",
    );
    for task in tasks {
        out.push_str(&format!(
            "<tr><td><a href=\"/tasks/{}\">{}</a></td><td>{}</td><td>{}</td><td>{}</td></tr>",
            task.id,
            escape(&task.title),
            task.status.as_str(),
            task.priority.as_str(),
            format_deadline(task)
        ));
    }
    out.push_str("</table>");
    out
}

pub fn task_detail(task: &Task) -> String {
    format!(
        "<dl class=\"task\"><dt>Title</dt><dd>{}</dd><dt>Description</dt><dd>{}</dd>\
         <dt>Status</dt><dd>{}</dd><dt>Priority</dt><dd>{}</dd><dt>Deadline</dt><dd>{}</dd></dl>\n\
         <a href=\"/tasks/{id}/edit\">Edit</a>\n\
         <form method=\"post\" action=\"/tasks/{id}/delete\"><button type=\"submit\">Delete</button></form>",
        escape(&task.title),
        escape(&task.description),
        task.status.as_str(),
        task.priority.as_str(),
        format_deadline(task),
        id = task.id,
    )
}

/// Values pre-filled into the task form.
#[derive(Debug, Default)]
pub struct TaskFormValues<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub deadline: &'a str,
}

impl<'a> From<&'a Task> for TaskFormValues<'a> {
    fn from(task: &'a Task) -> Self {
        Self {
            title: &task.title,
            description: &task.description,
            status: task.status,
            priority: task.priority,
            deadline: "",
        }
    }
}

pub fn task_form(action: &str, values: &TaskFormValues<'_>, deadline: Option<String>) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "<form method=\"post\" action=\"{}\">\
         <label>Title <input name=\"title\" maxlength=\"13\" value=\"{}\"></label>\
         <label>Description <textarea name=\"description\" maxlength=\"200\">{}</textarea></label>",
        escape(action),
        escape(values.title),
        escape(values.description)
    ));

    out.push_str("<label>Status <select name=\"status\">");
    for status in TaskStatus::ALL {
        option(&mut out, status.as_str(), status == values.status);
    }
    out.push_str("</select></label><label>Priority <select name=\"priority\">");
    for priority in TaskPriority::ALL {
        option(&mut out, priority.as_str(), priority == values.priority);
    }
    out.push_str("</select></label>");

    let deadline = deadline.unwrap_or_else(|| values.deadline.to_string());
    out.push_str(&format!(
        "<label>Deadline <input type=\"datetime-local\" name=\"deadline\" value=\"{}\"></label>\
         <button type=\"submit\">Save</button></form>",
        escape(&deadline)
    ));
    out
}

fn option(out: &mut String, value: &str, selected: bool) {
    out.push_str(&format!(
        "<option value=\"{0}\"{1}>{0}</option>",
        value,
        if selected { " selected" } else { "" }
    ));
}

/// A labelled form whose inputs are all required.
pub fn simple_form(action: &str, fields: &[(&str, &str, &str)], submit: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "<form method=\"post\" action=\"{}\">",
        escape(action)
    ));
    for (name, input_type, label) in fields {
        out.push_str(&format!(
            "<label>{} <input type=\"{}\" name=\"{}\" required></label>",
            escape(label),
            input_type,
            name
        ));
    }
    out.push_str(&format!(
        "<button type=\"submit\">{}</button></form>",
        escape(submit)
    ));
    out
}

/// Deadline in the `datetime-local` input format, UTC.
pub fn deadline_input_value(task: &Task) -> Option<String> {
    task.deadline
        .map(|deadline| deadline.format("%Y-%m-%dT%H:%M").to_string())
}

fn format_deadline(task: &Task) -> String {
    match task.deadline {
        Some(deadline) => deadline.format("%Y-%m-%d %H:%M UTC").to_string(),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskInput;
    use chrono::{TimeZone, Utc};

    fn task(title: &str) -> Task {
        Task::new(
            TaskInput {
                title: title.to_string(),
                description: "<b>bold</b>".to_string(),
                status: TaskStatus::InProgress,
                priority: TaskPriority::High,
                deadline: Some(Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap()),
            },
            1,
        )
    }

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"<script>alert("x" & 'y')</script>"#),
            "&lt;script&gt;alert(&quot;x&quot; &amp; &#x27;y&#x27;)&lt;/script&gt;"
        );
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn test_task_markup_is_escaped() {
        let task = task("<i>x</i>");
        let table = task_table(&[task.clone()]);
        assert!(table.contains("&lt;i&gt;x&lt;/i&gt;"));
        assert!(!table.contains("<i>"));
        assert!(table.contains("2024-05-01 09:30 UTC"));

        let detail = task_detail(&task);
        assert!(detail.contains("&lt;b&gt;bold&lt;/b&gt;"));
        assert!(detail.contains("in-progress"));
    }

    #[test]
    fn test_task_form_selects_current_values() {
        let task = task("Report");
        let form = task_form("/tasks/1/edit", &TaskFormValues::from(&task), deadline_input_value(&task));
        assert!(form.contains("<option value=\"in-progress\" selected>"));
        assert!(form.contains("<option value=\"high\" selected>"));
        assert!(form.contains("value=\"2024-05-01T09:30\""));
    }

    #[test]
    fn test_simple_form_and_errors() {
        let form = simple_form(
            "/login",
            &[("username", "text", "Username"), ("password", "password", "Password")],
            "Log in",
        );
        assert!(form.starts_with("<form method=\"post\" action=\"/login\">"));
        assert!(form.contains("<input type=\"password\" name=\"password\" required>"));
        assert!(form.ends_with("<button type=\"submit\">Log in</button></form>"));

        assert_eq!(errors(&[]), "");
        assert_eq!(
            errors(&["Bad <input>".to_string()]),
            "<ul class=\"errors\"><li>Bad &lt;input&gt;</li></ul>"
        );
    }

    #[test]
    fn test_layout_hides_near_deadline_for_anonymous() {
        let near = vec![task("Soon")];
        let anonymous = layout("Home", None, &near, "<p>hi</p>");
        assert!(!anonymous.contains("Due within a day"));
        assert!(anonymous.contains("/login"));

        let user = User {
            id: 1,
            username: "alice".into(),
            password_hash: String::new(),
            created_at: Utc::now(),
        };
        let signed_in = layout("Home", Some(&user), &near, "<p>hi</p>");
        assert!(signed_in.contains("Due within a day"));
        assert!(signed_in.contains("Soon"));
        assert!(signed_in.contains("alice"));
    }
}
