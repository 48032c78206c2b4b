use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

const UNTITLED: &str = "Untitled Research";
const AI_TAG: &str = "ai-enhanced";

/// A free-form markdown research note. Local only, never synced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResearchNote {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    /// Display order is insertion order; no duplicates.
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl ResearchNote {
    fn new(title: &str, content: &str, tags: &[&str]) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.to_string(),
            content: content.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            created_at: Utc::now(),
        }
    }

    /// Add a tag unless it is blank or already present. Returns whether it was added.
    pub fn add_tag(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() || self.tags.iter().any(|t| t == tag) {
            return false;
        }
        self.tags.push(tag.to_string());
        true
    }

    /// Topic sent for AI expansion: the title, or the first content line
    /// while the note still carries the placeholder title.
    pub fn research_topic(&self) -> String {
        if self.title == UNTITLED {
            self.content
                .lines()
                .next()
                .unwrap_or("")
                .replacen('#', "", 1)
                .trim()
                .to_string()
        } else {
            self.title.clone()
        }
    }

    /// Append AI-generated research avenues as a checklist. Existing content is kept.
    pub fn append_research_ideas(&mut self, ideas: &[String]) {
        self.content.push_str("\n\n## AI Generated Research Avenues\n");
        let checklist: Vec<String> = ideas.iter().map(|idea| format!("- [ ] {idea}")).collect();
        self.content.push_str(&checklist.join("\n"));
        self.add_tag(AI_TAG);
    }
}

/// Ordered collection of notes (newest first) with a current selection.
#[derive(Debug, Clone, Default)]
pub struct Notebook {
    notes: Vec<ResearchNote>,
    selected: Option<Uuid>,
}

impl Notebook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notebook holding the starter note shown on first launch.
    pub fn seeded() -> Self {
        Self {
            notes: vec![ResearchNote::new(
                "Performance Optimization Strategy",
                "# Strategy\nWe need to look into React Compiler...",
                &["perf", "react"],
            )],
            selected: None,
        }
    }

    pub fn notes(&self) -> &[ResearchNote] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn get(&self, id: Uuid) -> Option<&ResearchNote> {
        self.notes.iter().find(|n| n.id == id)
    }

    pub fn get_mut(&mut self, id: Uuid) -> Option<&mut ResearchNote> {
        self.notes.iter_mut().find(|n| n.id == id)
    }

    /// Create a blank note at the top of the list and select it.
    pub fn create(&mut self) -> Uuid {
        let note = ResearchNote::new(UNTITLED, "# New Research Topic\n\nStart typing...", &["draft"]);
        let id = note.id;
        self.notes.insert(0, note);
        self.selected = Some(id);
        id
    }

    /// Remove a note; clears the selection if it pointed at it.
    pub fn delete(&mut self, id: Uuid) -> bool {
        let before = self.notes.len();
        self.notes.retain(|n| n.id != id);
        if self.selected == Some(id) {
            self.selected = None;
        }
        self.notes.len() != before
    }

    pub fn select(&mut self, id: Uuid) -> bool {
        if self.get(id).is_some() {
            self.selected = Some(id);
            true
        } else {
            false
        }
    }

    pub fn selected(&self) -> Option<&ResearchNote> {
        self.selected.and_then(|id| self.get(id))
    }

    pub fn selected_mut(&mut self) -> Option<&mut ResearchNote> {
        let id = self.selected?;
        self.get_mut(id)
    }

    pub fn set_title(&mut self, id: Uuid, title: &str) -> bool {
        self.get_mut(id).map(|n| n.title = title.to_string()).is_some()
    }

    pub fn set_content(&mut self, id: Uuid, content: &str) -> bool {
        self.get_mut(id).map(|n| n.content = content.to_string()).is_some()
    }

    pub fn add_tag(&mut self, id: Uuid, tag: &str) -> bool {
        self.get_mut(id).is_some_and(|n| n.add_tag(tag))
    }
}
