use chrono::{Duration, Utc};

use super::types::{Author, Issue, IssueState, Label};

/// Built-in issues shown when no repository is configured or GitHub can't
/// be reached, so the dashboard always has something to render.
pub fn sample_issues() -> Vec<Issue> {
    let now = Utc::now();
    vec![
        Issue {
            id: 101,
            number: 42,
            title: "Memory leak in WebSocket connection".to_string(),
            body: "After about 2 hours of continuous uptime, the memory usage spikes by 400MB. \
                   I suspect the event listeners aren't being cleaned up in the `SocketProvider`."
                .to_string(),
            state: IssueState::Open,
            url: "#".to_string(),
            created_at: now,
            labels: vec![label("bug", "d73a4a"), label("urgent", "b60205")],
            author: author("dev_guru", 1),
            comment_count: 3,
        },
        Issue {
            id: 102,
            number: 45,
            title: "Add support for dark mode toggling".to_string(),
            body: "Users are requesting a manual toggle for dark mode instead of relying solely on system preference."
                .to_string(),
            state: IssueState::Open,
            url: "#".to_string(),
            created_at: now - Duration::days(1),
            labels: vec![label("feature", "a2eeef")],
            author: author("frontend_wiz", 2),
            comment_count: 1,
        },
        Issue {
            id: 103,
            number: 51,
            title: "Refactor Authentication Middleware".to_string(),
            body: "The current auth middleware is too coupled with the user service. \
                   We need to extract it into a standalone package."
                .to_string(),
            state: IssueState::Closed,
            url: "#".to_string(),
            created_at: now - Duration::days(2),
            labels: vec![label("refactor", "cfd3d7")],
            author: author("arch_lead", 3),
            comment_count: 5,
        },
    ]
}

fn label(name: &str, color_hex: &str) -> Label {
    Label {
        name: name.to_string(),
        color_hex: color_hex.to_string(),
    }
}

fn author(handle: &str, avatar: u32) -> Author {
    Author {
        handle: handle.to_string(),
        avatar_url: format!("https://picsum.photos/40/40?random={avatar}"),
    }
}
