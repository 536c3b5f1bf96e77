//! Newick phylogeny loading and Faith's phylogenetic diversity.
//!
//! Nodes live in an arena with parent links. The parser is iterative, so
//! deeply nested (caterpillar) trees do not grow the call stack.

use anyhow::{bail, Context, Result};
use rustc_hash::FxHashMap;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct TreeNode {
    pub parent: Option<usize>,
    pub edge_length: f64,
    pub label: Option<String>,
    pub n_children: usize,
}

impl TreeNode {
    pub fn is_leaf(&self) -> bool {
        self.n_children == 0
    }
}

#[derive(Debug, Clone, Default)]
pub struct PhyloTree {
    nodes: Vec<TreeNode>,
    tips: FxHashMap<String, usize>,
}

impl PhyloTree {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read tree file: {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Failed to parse Newick tree: {}", path.display()))
    }

    pub fn parse(newick: &str) -> Result<Self> {
        Parser::new(newick).run()
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_tips(&self) -> usize {
        self.tips.len()
    }

    pub fn node(&self, idx: usize) -> Option<&TreeNode> {
        self.nodes.get(idx)
    }

    pub fn tip(&self, label: &str) -> Option<usize> {
        self.tips.get(label).copied()
    }

    /// Faith's PD over tip nodes.
    ///
    /// Sums the edge lengths of every node that lies on a path from a tip up
    /// to the tips' most recent common ancestor, excluding the edge above that
    /// ancestor. Fewer than two distinct tips give 0.
    pub fn faiths_pd(&self, tip_nodes: &[usize]) -> f64 {
        let mut tips: Vec<usize> = tip_nodes
            .iter()
            .copied()
            .filter(|&i| i < self.nodes.len())
            .collect();
        tips.sort_unstable();
        tips.dedup();
        if tips.len() < 2 {
            return 0.0;
        }

        // Node counts tips below it; count == k marks the MRCA and its ancestors
        let mut below: FxHashMap<usize, usize> = FxHashMap::default();
        for &tip in &tips {
            let mut current = Some(tip);
            while let Some(idx) = current {
                *below.entry(idx).or_insert(0) += 1;
                current = self.nodes[idx].parent;
            }
        }

        let k = tips.len();
        below
            .into_iter()
            .filter(|&(_, count)| count < k)
            .map(|(idx, _)| self.nodes[idx].edge_length)
            .sum()
    }
}

struct Parser<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    nodes: Vec<TreeNode>,
    open: Vec<usize>,
    /// Node that a following label or `:length` applies to.
    last: Option<usize>,
    expecting_child: bool,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            chars: text.char_indices().peekable(),
            nodes: Vec::new(),
            open: Vec::new(),
            last: None,
            expecting_child: true,
        }
    }

    fn push_node(&mut self) -> usize {
        let parent = self.open.last().copied();
        if let Some(p) = parent {
            self.nodes[p].n_children += 1;
        }
        self.nodes.push(TreeNode {
            parent,
            edge_length: 0.0,
            label: None,
            n_children: 0,
        });
        self.nodes.len() - 1
    }

    /// Node for the current position, creating an unnamed leaf if needed.
    fn current_node(&mut self) -> usize {
        match self.last {
            Some(idx) => idx,
            None => {
                let idx = self.push_node();
                self.last = Some(idx);
                self.expecting_child = false;
                idx
            }
        }
    }

    fn run(mut self) -> Result<PhyloTree> {
        let mut terminated = false;
        while let Some((pos, ch)) = self.chars.next() {
            match ch {
                c if c.is_whitespace() => {}
                '[' => self.skip_comment(pos)?,
                '(' => {
                    if self.open.is_empty() && !self.nodes.is_empty() {
                        bail!("unexpected '(' at byte {} after the root closed", pos);
                    }
                    let idx = self.push_node();
                    self.open.push(idx);
                    self.last = None;
                    self.expecting_child = true;
                }
                ',' => {
                    if self.open.is_empty() {
                        bail!("',' outside any clade at byte {}", pos);
                    }
                    if self.expecting_child {
                        self.current_node();
                    }
                    self.last = None;
                    self.expecting_child = true;
                }
                ')' => {
                    if self.expecting_child {
                        self.current_node();
                    }
                    let Some(idx) = self.open.pop() else {
                        bail!("unbalanced ')' at byte {}", pos);
                    };
                    self.last = Some(idx);
                    self.expecting_child = false;
                }
                ':' => {
                    let idx = self.current_node();
                    let length = self.read_number(pos)?;
                    self.nodes[idx].edge_length = length;
                }
                ';' => {
                    terminated = true;
                    break;
                }
                '\'' => {
                    let label = self.read_quoted(pos)?;
                    self.set_label(label, pos)?;
                }
                _ => {
                    let label = self.read_bare(ch);
                    self.set_label(label, pos)?;
                }
            }
        }

        if !self.open.is_empty() {
            bail!("unbalanced '(' : {} clade(s) left open", self.open.len());
        }
        if !terminated {
            bail!("missing terminating ';'");
        }
        if self.nodes.is_empty() {
            bail!("empty tree");
        }

        let mut tips = FxHashMap::default();
        for (idx, node) in self.nodes.iter().enumerate() {
            if let (true, Some(label)) = (node.is_leaf(), node.label.as_ref()) {
                tips.insert(label.clone(), idx);
            }
        }
        Ok(PhyloTree { nodes: self.nodes, tips })
    }

    fn set_label(&mut self, label: String, pos: usize) -> Result<()> {
        let idx = self.current_node();
        if self.nodes[idx].label.is_some() {
            bail!("second label for one node at byte {}", pos);
        }
        self.nodes[idx].label = Some(label);
        Ok(())
    }

    fn skip_comment(&mut self, start: usize) -> Result<()> {
        for (_, ch) in self.chars.by_ref() {
            if ch == ']' {
                return Ok(());
            }
        }
        bail!("unterminated comment starting at byte {}", start)
    }

    fn read_quoted(&mut self, start: usize) -> Result<String> {
        let mut label = String::new();
        while let Some((_, ch)) = self.chars.next() {
            if ch == '\'' {
                // '' is an escaped quote
                if matches!(self.chars.peek(), Some((_, '\''))) {
                    self.chars.next();
                    label.push('\'');
                } else {
                    return Ok(label);
                }
            } else {
                label.push(ch);
            }
        }
        bail!("unterminated quoted label starting at byte {}", start)
    }

    fn read_bare(&mut self, first: char) -> String {
        let mut label = String::from(first);
        while let Some(&(_, ch)) = self.chars.peek() {
            if matches!(ch, '(' | ')' | ',' | ':' | ';' | '[') || ch.is_whitespace() {
                break;
            }
            label.push(ch);
            self.chars.next();
        }
        // Unquoted underscores stand for blanks
        label.replace('_', " ")
    }

    fn read_number(&mut self, start: usize) -> Result<f64> {
        let mut text = String::new();
        while let Some(&(_, ch)) = self.chars.peek() {
            if ch.is_whitespace() && text.is_empty() {
                self.chars.next();
                continue;
            }
            if ch.is_ascii_digit() || matches!(ch, '.' | '-' | '+' | 'e' | 'E') {
                text.push(ch);
                self.chars.next();
            } else {
                break;
            }
        }
        let value: f64 = text
            .parse()
            .with_context(|| format!("invalid branch length {:?} at byte {}", text, start))?;
        if !value.is_finite() {
            bail!("non-finite branch length at byte {}", start);
        }
        Ok(value)
    }
}
