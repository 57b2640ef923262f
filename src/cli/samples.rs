//! Built-in sample tasks and the interactive task picker.

use std::io::{BufRead, Write};

pub const SAMPLE_TASKS: [&str; 4] = [
    "Write a Python function to calculate compound interest with documentation and examples",
    "Create a 3-paragraph explanation of why exercise is important for mental health",
    "Design a simple daily routine for someone working from home",
    "Write a professional email declining a job offer politely",
];

/// Sample task by 1-based index.
pub fn sample(index: usize) -> Option<&'static str> {
    index.checked_sub(1).and_then(|i| SAMPLE_TASKS.get(i)).copied()
}

/// What a line typed at the picker means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Choice {
    Sample(&'static str),
    Custom,
    Invalid,
}

pub fn parse_choice(input: &str) -> Choice {
    match input.trim().parse::<usize>() {
        Ok(n) if n == SAMPLE_TASKS.len() + 1 => Choice::Custom,
        Ok(n) => sample(n).map(Choice::Sample).unwrap_or(Choice::Invalid),
        Err(_) => Choice::Invalid,
    }
}

/// Ask for a task on `output`, reading answers from `input`.
/// Returns None when input ends before a task is chosen.
pub fn pick_task<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> std::io::Result<Option<String>> {
    writeln!(output, "\nChoose a task:")?;
    for (i, task) in SAMPLE_TASKS.iter().enumerate() {
        writeln!(output, "{}. {}", i + 1, task)?;
    }
    let custom = SAMPLE_TASKS.len() + 1;
    writeln!(output, "{}. Enter your own task", custom)?;

    loop {
        write!(output, "\nEnter choice (1-{}): ", custom)?;
        output.flush()?;
        let Some(line) = read_line(input)? else {
            return Ok(None);
        };

        match parse_choice(&line) {
            Choice::Sample(task) => return Ok(Some(task.to_string())),
            Choice::Custom => {
                write!(output, "Enter your task: ")?;
                output.flush()?;
                match read_line(input)? {
                    None => return Ok(None),
                    Some(task) if !task.trim().is_empty() => return Ok(Some(task.trim().to_string())),
                    Some(_) => writeln!(output, "Please enter a task!")?,
                }
            }
            Choice::Invalid => writeln!(output, "Please enter a number from 1 to {}", custom)?,
        }
    }
}

fn read_line<R: BufRead>(input: &mut R) -> std::io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_sample_is_one_based() {
        assert_eq!(sample(1), Some(SAMPLE_TASKS[0]));
        assert_eq!(sample(4), Some(SAMPLE_TASKS[3]));
        assert_eq!(sample(0), None);
        assert_eq!(sample(5), None);
    }

    #[test]
    fn test_parse_choice() {
        assert_eq!(parse_choice(" 2\n"), Choice::Sample(SAMPLE_TASKS[1]));
        assert_eq!(parse_choice("5"), Choice::Custom);
        assert_eq!(parse_choice("6"), Choice::Invalid);
        assert_eq!(parse_choice("abc"), Choice::Invalid);
    }

    #[test]
    fn test_pick_sample() {
        let mut input = Cursor::new("3\n");
        let mut output = Vec::new();
        let task = pick_task(&mut input, &mut output).unwrap();
        assert_eq!(task.as_deref(), Some(SAMPLE_TASKS[2]));
        assert!(String::from_utf8(output).unwrap().contains("5. Enter your own task"));
    }

    #[test]
    fn test_pick_custom_after_invalid() {
        let mut input = Cursor::new("9\n5\n\n5\nWrite a limerick\n");
        let mut output = Vec::new();
        let task = pick_task(&mut input, &mut output).unwrap();
        assert_eq!(task.as_deref(), Some("Write a limerick"));

        let shown = String::from_utf8(output).unwrap();
        assert!(shown.contains("Please enter a number"));
        assert!(shown.contains("Please enter a task!"));
    }

    #[test]
    fn test_pick_eof() {
        let mut input = Cursor::new("");
        let mut output = Vec::new();
        assert_eq!(pick_task(&mut input, &mut output).unwrap(), None);
    }
}
