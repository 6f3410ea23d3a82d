//! Interactive shell over a persistent [`Engine`].
//!
//! Each line is either Brainfuck code, run against the tape left behind by
//! earlier lines, or a `$`-prefixed string of one-letter commands that inspect
//! or reset the tape (`$lxd` prints location, hex value and decimal value).

use std::borrow::Cow;
use std::io::{self, Write};
use std::path::PathBuf;

use cross_xdg::BaseDirs;
use nu_ansi_term::Style;
use reedline::{
    FileBackedHistory, Highlighter, Prompt, PromptEditMode, PromptHistorySearch,
    PromptHistorySearchStatus, Reedline, Signal, StyledText,
};
use tracing::debug;

use crate::cli_util;
use crate::config::{ShellSettings, MAX_WINDOW};
use crate::engine::Engine;
use crate::theme::Palette;

/// Lines starting with this character are shell commands, not code.
pub const META_PREFIX: char = '$';

const HISTORY_CAPACITY: usize = 1_000;
const HISTORY_FILE: &str = "bfi_history.txt";

/// Whether the shell keeps going after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellMode {
    /// Plain line reading, no prompt; used when stdin is piped.
    Bare,
    /// Line editor with prompt, history and highlighting.
    Editor,
}

/// Pick the shell mode from `BFI_SHELL_MODE` (if set) or the terminal state.
pub fn select_mode(env_value: Option<&str>, stdin_is_tty: bool) -> Result<ShellMode, String> {
    let Some(val) = env_value else {
        return Ok(if stdin_is_tty { ShellMode::Editor } else { ShellMode::Bare });
    };

    match val.trim().to_ascii_lowercase().as_str() {
        "bare" => Ok(ShellMode::Bare),
        "editor" if stdin_is_tty => Ok(ShellMode::Editor),
        "editor" => Err("cannot start editor: stdin is not a TTY (use BFI_SHELL_MODE=bare)".to_string()),
        _ => Err(format!("invalid BFI_SHELL_MODE value: {val}, must be 'bare' or 'editor'")),
    }
}

pub struct Shell {
    engine: Engine,
    newlines: bool,
    window: usize,
}

impl Shell {
    pub fn new(engine: Engine, settings: &ShellSettings) -> Self {
        Self {
            engine,
            newlines: settings.newlines,
            window: settings.window.clamp(1, MAX_WINDOW),
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn newlines(&self) -> bool {
        self.newlines
    }

    /// Handle one line of input. Command output goes to `out`; program
    /// output goes wherever the engine sends it.
    pub fn handle_line<W: Write>(&mut self, line: &str, out: &mut W) -> io::Result<Flow> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Flow::Continue);
        }

        let flow = match line.strip_prefix(META_PREFIX) {
            Some(commands) => self.run_commands(commands, out)?,
            None => {
                self.execute_line(line, out)?;
                Flow::Continue
            }
        };
        out.flush()?;
        Ok(flow)
    }

    fn execute_line<W: Write>(&mut self, code: &str, out: &mut W) -> io::Result<()> {
        match self.engine.execute(code) {
            Ok(()) if self.newlines => writeln!(out),
            Ok(()) => Ok(()),
            Err(err) => {
                cli_util::print_engine_error(None, code, &err);
                Ok(())
            }
        }
    }

    fn run_commands<W: Write>(&mut self, commands: &str, out: &mut W) -> io::Result<Flow> {
        for cmd in commands.chars().filter(|c| !c.is_whitespace()) {
            let tape = self.engine.tape();
            match cmd {
                'q' => return Ok(Flow::Quit),
                'h' => write_help(out)?,
                'l' => writeln!(out, "{}", tape.cursor())?,
                'x' => writeln!(out, "0x{:02x}", tape.current_value())?,
                'd' => writeln!(out, "{}", tape.current_value())?,
                'w' => self.write_window(out)?,
                'n' => {
                    self.newlines = !self.newlines;
                    writeln!(out, "Newlines: {}", if self.newlines { "on" } else { "off" })?;
                }
                'r' => {
                    self.engine.reset();
                    writeln!(out, "Memory zeroed")?;
                }
                other => writeln!(out, "Unknown command: {other}")?,
            }
        }
        Ok(Flow::Continue)
    }

    /// Two rows: cell values in hex and their indices, cursor in the middle column.
    fn write_window<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let tape = self.engine.tape();
        let half = (self.window / 2) as isize;
        let indices: Vec<usize> = (-half..=half).map(|delta| tape.offset(delta)).collect();
        let width = indices
            .iter()
            .map(|i| i.to_string().len())
            .max()
            .unwrap_or(0)
            .max(4);

        let mut values = String::from("val:");
        let mut pointers = String::from("ptr:");
        for &i in &indices {
            values.push_str(&format!(" {:<width$}", format!("0x{:02x}", tape.value_at(i))));
            pointers.push_str(&format!(" {:<width$}", i));
        }
        writeln!(out, "{}", values.trim_end())?;
        writeln!(out, "{}", pointers.trim_end())
    }
}

fn write_help<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(
        out,
        r#"Interactive shell:
  Evaluates Brainfuck code one line at a time; the tape persists between lines
  Start input with '{META_PREFIX}' to run shell commands (several may follow one '{META_PREFIX}')

Commands:
  h    Help (this message)
  q    Exit
  l    Print cursor location
  x    Print current cell value in hex
  d    Print current cell value in decimal
  w    Print a window of cells around the cursor
  n    Toggle newlines (after code is executed)
  r    Reset (zero) memory and return cursor to 0"#
    )
}

/// Read lines with `read_line` until EOF or `$q`. No prompt is printed.
///
/// `read_line` should not hold a lock on stdin between calls: programs run by
/// the shell read their `,` input from the same stream.
pub fn run_bare<F, W>(shell: &mut Shell, mut read_line: F, out: &mut W) -> io::Result<()>
where
    F: FnMut(&mut String) -> io::Result<usize>,
    W: Write,
{
    loop {
        let mut line = String::new();
        if read_line(&mut line)? == 0 {
            return Ok(());
        }
        if shell.handle_line(&line, out)? == Flow::Quit {
            return Ok(());
        }
    }
}

/// Interactive loop with a line editor, until `$q`, Ctrl+D or Ctrl+C.
pub fn run_editor(shell: &mut Shell, prompt: &str, palette: &Palette) -> io::Result<()> {
    let mut editor = init_line_editor(palette)?;
    let prompt = ShellPrompt::new(prompt);

    loop {
        match editor.read_line(&prompt) {
            Ok(Signal::Success(line)) => {
                if shell.handle_line(&line, &mut io::stdout())? == Flow::Quit {
                    return Ok(());
                }
            }
            Ok(Signal::CtrlC) | Ok(Signal::CtrlD) => {
                println!();
                io::stdout().flush()?;
                return Ok(());
            }
            Err(e) => {
                eprintln!("shell: editor error: {e}");
                let _ = io::stderr().flush();
                return Ok(());
            }
        }
    }
}

/// Renders as `<name>> `, e.g. `bf> `.
struct ShellPrompt {
    name: String,
}

impl ShellPrompt {
    fn new(name: &str) -> Self {
        Self { name: name.to_string() }
    }
}

impl Prompt for ShellPrompt {
    fn render_prompt_left(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.name)
    }

    fn render_prompt_right(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, _mode: PromptEditMode) -> Cow<'_, str> {
        Cow::Borrowed("> ")
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<'_, str> {
        Cow::Borrowed("::: ")
    }

    fn render_prompt_history_search_indicator(&self, search: PromptHistorySearch) -> Cow<'_, str> {
        let prefix = match search.status {
            PromptHistorySearchStatus::Passing => "",
            PromptHistorySearchStatus::Failing => "failing ",
        };
        Cow::Owned(format!("({prefix}reverse-search: {}) ", search.term))
    }
}

fn init_line_editor(palette: &Palette) -> io::Result<Reedline> {
    // Persist history next to the config file when possible; fall back to memory only.
    let history = history_path()
        .and_then(|path| FileBackedHistory::with_file(HISTORY_CAPACITY, path).ok())
        .map_or_else(|| FileBackedHistory::new(HISTORY_CAPACITY), Ok)
        .map_err(|e| io::Error::other(e.to_string()))?;

    Ok(Reedline::create()
        .with_highlighter(Box::new(BrainfuckHighlighter::new(palette)))
        .with_history(Box::new(history)))
}

fn history_path() -> Option<PathBuf> {
    let base_dirs = BaseDirs::new().ok()?;
    let mut path = PathBuf::from(base_dirs.config_home());
    path.push(HISTORY_FILE);
    debug!(path = %path.display(), "shell history");
    Some(path)
}

struct BrainfuckHighlighter {
    palette: Palette,
}

impl BrainfuckHighlighter {
    fn new(palette: &Palette) -> Self {
        Self { palette: palette.clone() }
    }

    #[inline]
    fn style_for(&self, ch: char) -> Style {
        Style::new().fg(self.palette.color_for(ch)).bold()
    }
}

impl Highlighter for BrainfuckHighlighter {
    fn highlight(&self, line: &str, _cursor: usize) -> StyledText {
        let mut out: StyledText = StyledText::new();

        // Command lines are not code; keep them in one plain segment.
        if line.trim_start().starts_with(META_PREFIX) {
            out.push((Style::new().fg(self.palette.non_bf), line.to_string()));
            return out;
        }

        let mut current_style: Option<Style> = None;
        let mut buffer = String::new();

        for ch in line.chars() {
            let style = self.style_for(ch);

            match current_style {
                Some(s) if s == style => {
                    buffer.push(ch);
                }
                Some(s) => {
                    out.push((s, std::mem::take(&mut buffer)));
                    current_style = Some(style);
                    buffer.push(ch);
                }
                None => {
                    current_style = Some(style);
                    buffer.push(ch);
                }
            }
        }

        if let Some(s) = current_style {
            if !buffer.is_empty() {
                out.push((s, buffer));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, Cursor};
    use std::sync::{Arc, Mutex};

    fn shell(size: usize) -> (Shell, Arc<Mutex<Vec<u8>>>) {
        let mut engine = Engine::new(size).unwrap();
        let program_out = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&program_out);
        engine.set_output_sink(move |bytes| sink.lock().unwrap().extend_from_slice(bytes));
        engine.set_input_provider(|| None);
        (Shell::new(engine, &ShellSettings::default()), program_out)
    }

    #[test]
    fn prompt_renders_name_and_indicator() {
        let prompt = ShellPrompt::new(&ShellSettings::default().prompt);
        let rendered = format!(
            "{}{}",
            prompt.render_prompt_left(),
            prompt.render_prompt_indicator(PromptEditMode::Default)
        );
        assert_eq!(rendered, "bf> ");
        assert_eq!(prompt.render_prompt_right(), "");
    }

    #[test]
    fn oversized_window_setting_is_capped() {
        let engine = Engine::new(10).unwrap();
        let settings = ShellSettings { window: usize::MAX, ..ShellSettings::default() };
        let mut shell = Shell::new(engine, &settings);
        let mut out = Vec::new();
        shell.handle_line("$w", &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let first = text.lines().next().unwrap();
        assert_eq!(first.split_whitespace().count(), MAX_WINDOW + 1);
    }

    fn run(shell: &mut Shell, line: &str) -> (Flow, String) {
        let mut out = Vec::new();
        let flow = shell.handle_line(line, &mut out).unwrap();
        (flow, String::from_utf8(out).unwrap())
    }

    #[test]
    fn tape_persists_across_lines() {
        let (mut sh, _) = shell(10);
        run(&mut sh, "+++");
        run(&mut sh, ">++");
        assert_eq!(&sh.engine().tape().cells()[..2], &[3, 2]);
        assert_eq!(run(&mut sh, "$l").1, "1\n");
    }

    #[test]
    fn value_commands_print_hex_and_decimal() {
        let (mut sh, _) = shell(10);
        run(&mut sh, &"+".repeat(42));
        assert_eq!(run(&mut sh, "$x").1, "0x2a\n");
        assert_eq!(run(&mut sh, "$d").1, "42\n");
    }

    #[test]
    fn commands_run_left_to_right() {
        let (mut sh, _) = shell(10);
        run(&mut sh, ">+++++++");
        assert_eq!(run(&mut sh, "$l x d").1, "1\n0x07\n7\n");
    }

    #[test]
    fn quit_stops_processing_remaining_commands() {
        let (mut sh, _) = shell(10);
        let (flow, out) = run(&mut sh, "$lqd");
        assert_eq!(flow, Flow::Quit);
        assert_eq!(out, "0\n");
    }

    #[test]
    fn reset_zeroes_the_tape() {
        let (mut sh, _) = shell(10);
        run(&mut sh, "+>+>+");
        assert_eq!(run(&mut sh, "$r").1, "Memory zeroed\n");
        assert_eq!(sh.engine().tape().cursor(), 0);
        assert!(sh.engine().tape().cells().iter().all(|&c| c == 0));
    }

    #[test]
    fn newline_toggle_controls_trailing_newline() {
        let (mut sh, _) = shell(10);
        assert_eq!(run(&mut sh, "+").1, "");
        assert_eq!(run(&mut sh, "$n").1, "Newlines: on\n");
        assert!(sh.newlines());
        assert_eq!(run(&mut sh, "+").1, "\n");
        assert_eq!(run(&mut sh, "$n").1, "Newlines: off\n");
    }

    #[test]
    fn unknown_command_is_reported() {
        let (mut sh, _) = shell(10);
        assert_eq!(run(&mut sh, "$z").1, "Unknown command: z\n");
    }

    #[test]
    fn window_is_centered_and_wraps() {
        let (mut sh, _) = shell(10);
        run(&mut sh, "+++++++");
        let (_, out) = run(&mut sh, "$w");
        assert_eq!(
            out,
            "val: 0x00 0x00 0x07 0x00 0x00\nptr: 8    9    0    1    2\n"
        );
    }

    #[test]
    fn window_widens_for_large_indices() {
        let (mut sh, _) = shell(30_000);
        run(&mut sh, "<-");
        let (_, out) = run(&mut sh, "$w");
        assert_eq!(
            out,
            "val: 0x00  0x00  0xff  0x00  0x00\nptr: 29997 29998 29999 0     1\n"
        );
    }

    #[test]
    fn program_output_goes_to_the_engine_sink() {
        let (mut sh, program_out) = shell(10);
        let (_, out) = run(&mut sh, &format!("{}.", "+".repeat(65)));
        assert_eq!(out, "");
        assert_eq!(*program_out.lock().unwrap(), b"A".to_vec());
    }

    #[test]
    fn invalid_line_keeps_the_shell_running_and_tape_intact() {
        let (mut sh, _) = shell(10);
        run(&mut sh, "++");
        let (flow, out) = run(&mut sh, "+]");
        assert_eq!(flow, Flow::Continue);
        assert_eq!(out, "");
        assert_eq!(sh.engine().tape().current_value(), 2);
    }

    #[test]
    fn blank_lines_are_ignored() {
        let (mut sh, _) = shell(10);
        assert_eq!(run(&mut sh, "   \n"), (Flow::Continue, String::new()));
    }

    #[test]
    fn help_lists_every_command() {
        let (mut sh, _) = shell(10);
        let (_, out) = run(&mut sh, "$h");
        for cmd in ['h', 'q', 'l', 'x', 'd', 'w', 'n', 'r'] {
            assert!(out.contains(&format!("\n  {cmd}    ")), "missing {cmd}");
        }
    }

    #[test]
    fn bare_loop_stops_at_quit() {
        let (mut sh, _) = shell(10);
        let mut input = Cursor::new("+++\n$d\n$q\n+++\n$d\n");
        let mut out = Vec::new();
        run_bare(&mut sh, |buf| input.read_line(buf), &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "3\n");
        assert_eq!(sh.engine().tape().current_value(), 3);
    }

    #[test]
    fn bare_loop_ends_at_eof() {
        let (mut sh, _) = shell(10);
        let mut input = Cursor::new("+\n$d");
        let mut out = Vec::new();
        run_bare(&mut sh, |buf| input.read_line(buf), &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "1\n");
    }

    #[test]
    fn mode_follows_terminal_unless_overridden() {
        assert_eq!(select_mode(None, true), Ok(ShellMode::Editor));
        assert_eq!(select_mode(None, false), Ok(ShellMode::Bare));
        assert_eq!(select_mode(Some("bare"), true), Ok(ShellMode::Bare));
        assert_eq!(select_mode(Some("Editor"), true), Ok(ShellMode::Editor));
        assert!(select_mode(Some("editor"), false).unwrap_err().contains("not a TTY"));
        assert!(select_mode(Some("fancy"), true).is_err());
    }

    #[test]
    fn highlighter_groups_runs_of_same_color() {
        let hl = BrainfuckHighlighter::new(&Palette::default());
        let styled = hl.highlight("++>[", 0);
        let parts: Vec<&str> = styled.buffer.iter().map(|(_, s)| s.as_str()).collect();
        assert_eq!(parts, vec!["++", ">", "["]);

        let styled = hl.highlight("$lxd", 0);
        assert_eq!(styled.buffer.len(), 1);
    }
}
