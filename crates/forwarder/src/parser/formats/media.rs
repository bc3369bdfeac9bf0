//! media_saver / media_transcoder worker output.
//!
//! Workers print `LEVEL TAG message`, optionally behind their own
//! `2024-03-01 10:00:00.123:` timestamp. Only error blocks are forwarded,
//! the rest is transcoding chatter.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::parser::traits::*;

static LINE_WITH_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d\d-\d\d \d\d:\d\d:[\d.]+:\s(\w+)\s(\S+)\s(.*)$").expect("valid regex")
});

static LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\w+)\s(\S+)\s(.*)$").expect("valid regex"));

pub struct MediaWorkerHandler;

/// `(level, rest)` when the line opens a new worker message.
fn split_line(line: &str) -> Option<(&str, &str)> {
    LINE_WITH_DATE
        .captures(line)
        .or_else(|| LINE.captures(line))
        .and_then(|caps| Some((caps.get(1)?.as_str(), caps.get(3)?.as_str())))
}

impl FormatHandler for MediaWorkerHandler {
    fn handle(&self, message: &str, _default_level: Level) -> Vec<OutputFragment> {
        if message.is_empty() {
            return Vec::new();
        }

        let mut blocks: Vec<(Option<Level>, String)> = Vec::new();
        for line in message.split('\n') {
            match split_line(line) {
                Some((level, rest)) => blocks.push((Some(Level::resolve(level)), rest.to_string())),
                None => match blocks.last_mut() {
                    Some((_, text)) => {
                        text.push('\n');
                        text.push_str(line);
                    }
                    None => blocks.push((None, line.to_string())),
                },
            }
        }

        blocks
            .into_iter()
            .map(|(level, text)| (level.unwrap_or(Level::Debug), text))
            .filter(|(level, text)| *level == Level::Error && !text.is_empty())
            .map(|(level, text)| OutputFragment::new(level, text))
            .collect()
    }

    fn format(&self) -> Format {
        Format::MediaWorker
    }
}
