//! TerminalRenderer: flushes strips to a real terminal.
//!
//! The first frame (and any frame after a resize or [`TerminalRenderer::invalidate`])
//! is a full redraw. Later frames only rewrite rows whose strip changed.

use std::io::{self, Write};

use anyhow::Result;

use crossterm::{
    cursor,
    style::{Attribute, Print, ResetColor, SetAttribute},
    terminal, QueueableCommand,
};

use crate::strip::{StyleCache, Strip};

pub struct TerminalRenderer {
    stdout: io::Stdout,
    last: Vec<Strip>,
    has_frame: bool,
    buf: Vec<u8>,
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self {
            stdout: io::stdout(),
            last: Vec::new(),
            has_frame: false,
            buf: Vec::with_capacity(64 * 1024),
        }
    }

    pub fn enter(&mut self) -> Result<()> {
        terminal::enable_raw_mode()?;
        self.buf.clear();
        self.buf.queue(terminal::EnterAlternateScreen)?;
        self.buf.queue(cursor::Hide)?;
        self.buf.queue(terminal::DisableLineWrap)?;
        self.flush_buf()?;
        Ok(())
    }

    pub fn exit(&mut self) -> Result<()> {
        self.buf.clear();
        self.buf.queue(ResetColor)?;
        self.buf.queue(SetAttribute(Attribute::Reset))?;
        self.buf.queue(terminal::EnableLineWrap)?;
        self.buf.queue(cursor::Show)?;
        self.buf.queue(terminal::LeaveAlternateScreen)?;
        self.flush_buf()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    /// Force the next draw to be a full redraw.
    ///
    /// Useful on terminal resize events.
    pub fn invalidate(&mut self) {
        self.has_frame = false;
    }

    /// Draw a frame of strips, keeping it for the next diff.
    ///
    /// `strips` is swapped with the previous frame, so callers can pass the
    /// same vector every frame and refill it without reallocating.
    pub fn draw_strips(&mut self, strips: &mut Vec<Strip>, styles: &StyleCache) -> Result<()> {
        self.buf.clear();
        if self.has_frame && self.last.len() == strips.len() {
            encode_diff_into(&self.last, strips, styles, &mut self.buf)?;
        } else {
            encode_strips_into(strips, styles, &mut self.buf)?;
        }
        self.flush_buf()?;

        std::mem::swap(&mut self.last, strips);
        self.has_frame = true;
        Ok(())
    }

    fn flush_buf(&mut self) -> Result<()> {
        self.stdout.write_all(&self.buf)?;
        self.stdout.flush()?;
        Ok(())
    }
}

/// Encode a full redraw of `strips` into `out`.
///
/// This builds a sequence of crossterm commands without writing to stdout.
pub fn encode_strips_into(strips: &[Strip], styles: &StyleCache, out: &mut Vec<u8>) -> Result<()> {
    out.queue(terminal::Clear(terminal::ClearType::All))?;
    for strip in strips {
        encode_strip(strip, styles, out)?;
    }
    out.queue(ResetColor)?;
    out.queue(SetAttribute(Attribute::Reset))?;
    Ok(())
}

/// Encode only the strips that differ from `prev` (matched by position).
pub fn encode_diff_into(
    prev: &[Strip],
    next: &[Strip],
    styles: &StyleCache,
    out: &mut Vec<u8>,
) -> Result<()> {
    let mut changed = 0usize;
    for (i, strip) in next.iter().enumerate() {
        if prev.get(i) == Some(strip) {
            continue;
        }
        encode_strip(strip, styles, out)?;
        changed += 1;
    }
    if changed > 0 {
        out.queue(ResetColor)?;
        out.queue(SetAttribute(Attribute::Reset))?;
    }
    Ok(())
}

fn encode_strip(strip: &Strip, styles: &StyleCache, out: &mut Vec<u8>) -> Result<()> {
    out.queue(cursor::MoveTo(strip.x, strip.y))?;
    for run in &strip.runs {
        if let Some(style) = styles.get(run.style) {
            out.extend_from_slice(&style.sgr);
        }
        out.queue(Print(&run.text))?;
    }
    Ok(())
}
