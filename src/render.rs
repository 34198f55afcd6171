use crate::{
    model::{ArticleRecord, Group},
    rank::GroupRanking,
};
use anyhow::Result;
use askama::Template;
use serde::Serialize;
use std::io::Write;
use strum::{Display, EnumString};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Titles wider than this many terminal columns continue on the next line.
const TITLE_WIDTH: usize = 80;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Receives each group's ranking as soon as the group is done.
pub trait Presenter {
    fn present(&mut self, ranking: &GroupRanking) -> Result<()>;
}

#[derive(Debug)]
pub struct Renderer<W> {
    format: OutputFormat,
    out: W,
}

#[derive(Debug, Template)]
#[template(path = "ranking.txt", escape = "none")]
struct RankingTable {
    border: String,
    header: String,
    rows: Vec<String>,
}

#[derive(Debug, Serialize)]
struct RankingJson<'a> {
    group: &'a Group,
    articles: Vec<&'a ArticleRecord>,
}

impl<W: Write> Renderer<W> {
    pub fn new(format: OutputFormat, out: W) -> Self {
        Self { format, out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Presenter for Renderer<W> {
    fn present(&mut self, ranking: &GroupRanking) -> Result<()> {
        match self.format {
            OutputFormat::Table => {
                let table = render_table(ranking)?;
                writeln!(self.out, "{}", table.trim_end())?;
            }
            OutputFormat::Json => {
                let json = RankingJson {
                    group: ranking.group(),
                    articles: ranking.rows().collect(),
                };
                serde_json::to_writer(&mut self.out, &json)?;
                writeln!(self.out)?;
            }
        }
        self.out.flush()?;
        Ok(())
    }
}

pub fn render_table(ranking: &GroupRanking) -> Result<String> {
    let header = [
        vec!["Subscribers".to_string()],
        vec![format!("Topic ({})", ranking.group())],
        vec!["URL".to_string()],
    ];
    let cells: Vec<[Vec<String>; 3]> = ranking
        .rows()
        .map(|r| {
            [
                vec![r.subscribers.to_string()],
                wrap(&r.title, TITLE_WIDTH),
                vec![r.url.clone()],
            ]
        })
        .collect();

    let mut widths = [0usize; 3];
    for row in std::iter::once(&header).chain(&cells) {
        for (width, cell) in widths.iter_mut().zip(row) {
            for text in cell {
                *width = (*width).max(text.width());
            }
        }
    }

    let table = RankingTable {
        border: border(&widths),
        header: line(&header, &widths),
        rows: cells.iter().map(|row| line(row, &widths)).collect(),
    };
    Ok(table.render()?)
}

fn border(widths: &[usize; 3]) -> String {
    let segments: Vec<_> = widths.iter().map(|w| "-".repeat(w + 2)).collect();
    format!("+{}+", segments.join("+"))
}

/// Lays out one table row; a wrapped cell makes the row span several lines.
fn line(cells: &[Vec<String>; 3], widths: &[usize; 3]) -> String {
    let [count, title, url] = cells;
    let [wc, wt, wu] = *widths;
    let height = cells.iter().map(Vec::len).max().unwrap_or(1).max(1);

    (0..height)
        .map(|i| {
            format!(
                "| {} | {} | {} |",
                pad_left(cell_line(count, i), wc),
                pad_right(cell_line(title, i), wt),
                pad_right(cell_line(url, i), wu)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn cell_line(cell: &[String], i: usize) -> &str {
    cell.get(i).map(String::as_str).unwrap_or("")
}

/// Splits `s` into lines no wider than `width` terminal columns.
fn wrap(s: &str, width: usize) -> Vec<String> {
    let mut lines = vec![];
    let mut current = String::new();
    let mut current_width = 0;
    for ch in s.chars() {
        let w = ch.width().unwrap_or(0);
        if current_width + w > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            current_width = 0;
        }
        current.push(ch);
        current_width += w;
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

fn pad_left(s: &str, width: usize) -> String {
    let fill = width.saturating_sub(s.width());
    format!("{}{s}", " ".repeat(fill))
}

fn pad_right(s: &str, width: usize) -> String {
    let fill = width.saturating_sub(s.width());
    format!("{s}{}", " ".repeat(fill))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranking() -> GroupRanking {
        let record = |title: &str, subscribers| ArticleRecord {
            title: title.to_string(),
            url: format!("https://example.com/{title}"),
            subscribers,
        };
        GroupRanking::new(
            Group::from("web"),
            vec![
                record("a", 5),
                record("b", 20),
                record("c", 20),
                record("d", 3),
            ],
            10,
        )
    }

    #[test]
    fn render_table_should_work() {
        let table = render_table(&ranking()).unwrap();
        insta::assert_snapshot!(table.trim_end(), @r###"
+-------------+-------------+-----------------------+
| Subscribers | Topic (web) | URL                   |
+-------------+-------------+-----------------------+
|          20 | b           | https://example.com/b |
|          20 | c           | https://example.com/c |
+-------------+-------------+-----------------------+
"###);
    }

    #[test]
    fn render_table_should_align_wide_titles() {
        let long = "鐵人".repeat(50);
        let ranking = GroupRanking::new(
            Group::from("self"),
            vec![
                ArticleRecord {
                    title: "用 Rust 寫爬蟲".into(),
                    url: "https://example.com/1".into(),
                    subscribers: 120,
                },
                ArticleRecord {
                    title: long.clone(),
                    url: "https://example.com/2".into(),
                    subscribers: 30,
                },
            ],
            10,
        );

        let table = render_table(&ranking).unwrap();
        let lines: Vec<_> = table.trim_end().lines().collect();
        let width = lines[0].width();
        assert!(lines.iter().all(|l| l.width() == width));

        // 200 columns of title wrap into three lines of at most 80
        assert_eq!(lines.len(), 3 + 1 + 3 + 1);
        let title_lines: String = lines[4..7]
            .iter()
            .map(|l| l.split('|').nth(2).unwrap().trim())
            .collect();
        assert_eq!(title_lines, long);
    }

    #[test]
    fn wrap_should_respect_column_width() {
        assert_eq!(wrap("abcdef", 4), ["abcd", "ef"]);
        assert_eq!(wrap("系列系列", 5), ["系列", "系列"]);
        assert_eq!(wrap("", 4), [""]);
    }

    #[test]
    fn json_output_should_only_list_shown_rows() {
        let mut renderer = Renderer::new(OutputFormat::Json, Vec::new());
        renderer.present(&ranking()).unwrap();
        let out = String::from_utf8(renderer.into_inner()).unwrap();

        let value: serde_json::Value = serde_json::from_str(out.trim()).unwrap();
        assert_eq!(value["group"], "web");
        let articles = value["articles"].as_array().unwrap();
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0]["title"], "b");
        assert_eq!(articles[1]["subscribers"], 20);
    }

    #[test]
    fn output_format_should_parse_from_cli_text() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!(OutputFormat::Table.to_string(), "table");
        assert!("xml".parse::<OutputFormat>().is_err());
    }
}
