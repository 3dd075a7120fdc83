//! Functional category of syllables

use crate::config::SongDatabase;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NoteType {
    Motif,
    Call,
    IntroNote,
}

impl NoteType {
    pub fn code(&self) -> char {
        match self {
            NoteType::Motif => 'M',
            NoteType::Call => 'C',
            NoteType::IntroNote => 'I',
        }
    }
}

impl SongDatabase {
    /// Category of one label; motif wins over call, call over intro note
    pub fn note_type(&self, label: char) -> Option<NoteType> {
        if self.motif.contains(label) {
            Some(NoteType::Motif)
        } else if self.calls.contains(label) {
            Some(NoteType::Call)
        } else if self.intro_notes.contains(label) {
            Some(NoteType::IntroNote)
        } else {
            None
        }
    }
}

/// Category of every label
pub fn note_types(syllables: impl IntoIterator<Item = char>, song: &SongDatabase) -> Vec<Option<NoteType>> {
    syllables.into_iter().map(|s| song.note_type(s)).collect()
}
