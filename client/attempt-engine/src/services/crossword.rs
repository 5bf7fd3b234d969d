use std::collections::BTreeMap;

use crate::models::{CellRef, CrosswordEntry, CrosswordSpec};

/// Letter grid for one crossword attempt. The grid is the source of truth
/// while playing; the per-entry answer strings are re-derived from it on
/// every save by walking each entry's ordered cell positions.
pub struct CrosswordGrid {
    rows: usize,
    cols: usize,
    cells: Vec<Option<char>>,
    entries: Vec<CrosswordEntry>,
}

impl CrosswordGrid {
    pub fn new(spec: &CrosswordSpec) -> Self {
        Self {
            rows: spec.rows,
            cols: spec.cols,
            cells: vec![None; spec.rows * spec.cols],
            entries: spec.entries.clone(),
        }
    }

    fn index(&self, row: usize, col: usize) -> Option<usize> {
        if row < self.rows && col < self.cols {
            Some(row * self.cols + col)
        } else {
            None
        }
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<char> {
        self.index(row, col).and_then(|i| self.cells[i])
    }

    /// Place a letter. Whitespace clears the cell; letters are stored
    /// uppercased. Returns false for out-of-bounds positions.
    pub fn set_cell(&mut self, row: usize, col: usize, letter: char) -> bool {
        let Some(i) = self.index(row, col) else {
            tracing::warn!("Ignoring out-of-bounds cell ({}, {})", row, col);
            return false;
        };
        if letter.is_whitespace() {
            self.cells[i] = None;
        } else {
            self.cells[i] = letter.to_uppercase().next();
        }
        true
    }

    pub fn clear_cell(&mut self, row: usize, col: usize) -> bool {
        match self.index(row, col) {
            Some(i) => {
                self.cells[i] = None;
                true
            }
            None => false,
        }
    }

    /// Per-entry answer strings: blank cell → space, letter → uppercase.
    /// Every string has exactly the entry's cell count.
    pub fn entry_answers(&self) -> BTreeMap<String, String> {
        self.entries
            .iter()
            .map(|entry| {
                let answer: String = entry
                    .cells
                    .iter()
                    .map(|cell| self.lookup(cell).unwrap_or(' '))
                    .collect();
                (entry.id.clone(), answer)
            })
            .collect()
    }

    fn lookup(&self, cell: &CellRef) -> Option<char> {
        self.index(cell.row, cell.col).and_then(|i| self.cells[i])
    }

    /// Rehydrate the grid from a saved per-entry answers map (resume).
    /// Unknown entry ids are ignored; spaces stay blank.
    pub fn apply_answers(&mut self, answers: &BTreeMap<String, String>) {
        let layout = self.entries.clone();
        for entry in &layout {
            let Some(answer) = answers.get(&entry.id) else {
                continue;
            };
            for (cell, letter) in entry.cells.iter().zip(answer.chars()) {
                if letter == ' ' {
                    continue;
                }
                self.set_cell(cell.row, cell.col, letter);
            }
        }
    }
}
