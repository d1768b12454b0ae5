use crate::errors::{PriceHubError, Result};
use unicode_width::UnicodeWidthChar;

/// 东亚宽字符（含歧义宽度字符）按两列计算，其余按一列
pub fn char_width(c: char) -> usize {
    match c.width_cjk() {
        Some(2) => 2,
        _ => 1,
    }
}

pub fn str_width(s: &str) -> usize {
    s.chars().map(char_width).sum()
}

/// 按显示宽度截断字符串
///
/// Keeps characters up to and including the first one at which the running
/// width reaches `width`.
pub fn trim_to_width(s: &str, width: usize) -> String {
    let mut cur_width = 0;
    let mut out = String::new();
    for c in s.chars() {
        out.push(c);
        cur_width += char_width(c);
        if cur_width >= width {
            break;
        }
    }
    out
}

pub fn md_link(text: &str, link: &str) -> String {
    format!("[{}]({})", text, link)
}

fn check_shape(header: &[String], lines: &[Vec<String>]) -> Result<()> {
    for line in lines {
        if line.len() != header.len() {
            return Err(PriceHubError::InconsistentTableShape {
                row: line.clone(),
                header: header.to_vec(),
            });
        }
    }
    Ok(())
}

/// 等宽文本表格
pub struct PrettyTable {
    header: Vec<String>,
    lines: Vec<Vec<String>>,
    col_limit: Vec<usize>,
}

impl PrettyTable {
    const COL_SEPARATOR: &'static str = "  ";

    pub fn new(header: Vec<String>, lines: Vec<Vec<String>>) -> Result<Self> {
        check_shape(&header, &lines)?;

        let mut col_limit: Vec<usize> = header.iter().map(|h| str_width(h)).collect();
        for line in &lines {
            for (limit, col) in col_limit.iter_mut().zip(line) {
                *limit = (*limit).max(str_width(col));
            }
        }

        Ok(Self {
            header,
            lines,
            col_limit,
        })
    }

    pub fn format(&self) -> String {
        let mut output = self.format_line(&self.header);
        output += &self.format_separator();
        for line in &self.lines {
            output += &self.format_line(line);
        }
        output
    }

    // 宽度不足的列用空格补齐
    fn format_line(&self, line: &[String]) -> String {
        let cols: Vec<String> = line
            .iter()
            .zip(&self.col_limit)
            .map(|(col, &limit)| format!("{}{}", col, " ".repeat(limit - str_width(col))))
            .collect();
        cols.join(Self::COL_SEPARATOR) + "\n"
    }

    fn format_separator(&self) -> String {
        let mut sep_cnt: usize = self.col_limit.iter().sum();
        sep_cnt += self.col_limit.len().saturating_sub(1) * Self::COL_SEPARATOR.len();
        sep_cnt += 1;
        "-".repeat(sep_cnt) + "\n"
    }
}

/// Markdown 表格
pub struct MarkdownTable {
    header: Vec<String>,
    lines: Vec<Vec<String>>,
}

impl MarkdownTable {
    const COL_SEPARATOR: &'static str = " | ";

    pub fn new(header: Vec<String>, lines: Vec<Vec<String>>) -> Result<Self> {
        check_shape(&header, &lines)?;
        Ok(Self { header, lines })
    }

    fn embrace(s: &str) -> String {
        format!("| {} |\n", s)
    }

    pub fn format(&self) -> String {
        let mut out = Self::embrace(&self.header.join(Self::COL_SEPARATOR));
        let seps = vec!["----"; self.header.len()];
        out += &Self::embrace(&seps.join(Self::COL_SEPARATOR));
        for line in &self.lines {
            out += &Self::embrace(&line.join(Self::COL_SEPARATOR));
        }
        out + "\n\n"
    }
}
