//! lock-panel
//!
//! Terminal control panel for a lock station on a serial link. Shows the
//! station's registers, lets the operator store/delete keys and send
//! manual AT commands, and logs every line the station sends back.

use getopts::Options;
use std::env;
use std::io::stdout;
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use lockstation::command;
use lockstation::link::{self, Channel, RxEvent};
use lockstation::registers::RegisterStore;
use lockstation_tools::config::PanelConfig;
use lockstation_tools::sfx::{Cue, SfxPlayer};

use crossbeam::channel::Receiver;
use futures::{future::FutureExt, select, StreamExt};
use futures_timer::Delay;

use crossterm::ExecutableCommand;
use crossterm::{
    cursor::*,
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    style::*,
    terminal::*,
};

/// Redraw cadence of the panel.
const TICK: Duration = Duration::from_millis(100);

/// Entries kept in the message log.
const LOG_CAPACITY: usize = 500;

fn timestamp() -> String {
    chrono::Local::now().format("%T%.3f").to_string()
}

/// Lists serial devices that could be the station's adapter, marking USB
/// ports with their VID/PID.
fn enum_ports() {
    let ports = match serialport::available_ports() {
        Ok(ports) => ports,
        Err(e) => {
            eprintln!("ERROR: failed to enumerate serial ports: {:?}", e);
            return;
        }
    };
    if ports.is_empty() {
        println!("No serial ports found");
        return;
    }
    println!("Serial ports:");
    for p in ports {
        match p.port_type {
            serialport::SerialPortType::UsbPort(info) => {
                println!(
                    " * {} (usb, vid: {:04x} pid: {:04x})",
                    p.port_name, info.vid, info.pid
                );
            }
            _ => {
                println!(" * {}", p.port_name);
            }
        }
    }
}

/// Manual entries go out verbatim, but an empty one is rejected before
/// anything touches the link.
fn validate_manual_command(entry: &str) -> Result<&str, &'static str> {
    if entry.is_empty() {
        Err("COMMAND CANNOT BE NULL")
    } else {
        Ok(entry)
    }
}

/// Which entry field the keyboard currently feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    KeyEditor,
    ManualEntry,
}

struct Panel {
    store: RegisterStore,
    selected: usize,
    key_field: String,
    manual_field: String,
    focus: Focus,
    log: Vec<String>,
    port_label: String,
    chan: Channel,
    rx: Receiver<RxEvent>,
    sfx: SfxPlayer,
}

impl Panel {
    fn log_line(&mut self, message: String) {
        self.log.push(format!("{} {}", timestamp(), message));
        if self.log.len() > LOG_CAPACITY {
            let excess = self.log.len() - LOG_CAPACITY;
            self.log.drain(..excess);
        }
    }

    fn selected_name(&self) -> Option<String> {
        self.store.names().nth(self.selected).map(String::from)
    }

    /// Selection change shows the register's current key in the editor,
    /// replacing whatever was being typed (matches the panel's original
    /// behavior; an unassigned register leaves the field empty).
    fn seed_key_field(&mut self) {
        self.key_field = self
            .selected_name()
            .map(|name| self.store.get(&name).to_string())
            .unwrap_or_default();
    }

    fn play_cue(&mut self, cue: Cue) {
        match self.sfx.play(cue) {
            Ok(_) => {}
            Err(e) => self.log_line(format!("[ERROR] - sound playback: {}", e)),
        }
    }

    /// Sends a command over the link. A write failure is logged with the
    /// offending command and the panel keeps running.
    fn send_command(&mut self, cmd: &str) {
        match self.chan.write_command(cmd) {
            Ok(()) => self.log_line(format!("[SENT] - {}", cmd)),
            Err(e) => self.log_line(format!("[ERROR] - sending '{}': {:?}", cmd, e)),
        }
    }

    /// Add/update path: store the key field's content into the selected
    /// register and tell the station.
    fn store_key(&mut self) {
        let name = match self.selected_name() {
            Some(name) => name,
            None => return,
        };
        let key = self.key_field.clone();
        self.store.set(&name, &key);
        self.log_line(format!("[UPDATED] - {}: {}", name, key));
        let cmd = command::encode_upsert(&name, &key);
        self.send_command(&cmd);
        self.key_field.clear();
        self.play_cue(Cue::KeyStored);
    }

    /// Delete path: clear the selected register and tell the station.
    fn delete_key(&mut self) {
        let name = match self.selected_name() {
            Some(name) => name,
            None => return,
        };
        self.store.clear(&name);
        self.log_line(format!("[DELETED] - {}", name));
        let cmd = command::encode_delete(&name);
        self.send_command(&cmd);
        self.play_cue(Cue::KeyDeleted);
    }

    /// Manual path: send operator text verbatim. An empty entry is
    /// rejected before anything touches the link.
    fn manual_send(&mut self) {
        let cmd = match validate_manual_command(&self.manual_field) {
            Ok(cmd) => cmd.to_string(),
            Err(msg) => {
                self.log_line(format!("[ERROR] - {}", msg));
                return;
            }
        };
        self.send_command(&cmd);
        self.manual_field.clear();
        self.play_cue(Cue::ManualSend);
    }

    /// Pulls everything the reader thread has queued into the log.
    fn drain_rx(&mut self) {
        while let Ok(event) = self.rx.try_recv() {
            match event {
                RxEvent::Line(line) => self.log_line(format!("[RECEIVED] - {}", line)),
                RxEvent::Error(err) => self.log_line(format!("[ERROR] - serial read: {}", err)),
            }
        }
    }

    /// Handles one key event. Returns true when the operator quits.
    fn handle_key(&mut self, ev: KeyEvent) -> bool {
        if ev.kind == KeyEventKind::Release {
            return false;
        }
        if ev.modifiers.contains(KeyModifiers::CONTROL) && ev.code == KeyCode::Char('c') {
            return true;
        }
        match ev.code {
            KeyCode::Esc => return true,
            KeyCode::Tab => {
                self.focus = match self.focus {
                    Focus::KeyEditor => Focus::ManualEntry,
                    Focus::ManualEntry => Focus::KeyEditor,
                };
            }
            KeyCode::Up => {
                if self.selected > 0 {
                    self.selected -= 1;
                    self.seed_key_field();
                }
            }
            KeyCode::Down => {
                if self.selected + 1 < self.store.len() {
                    self.selected += 1;
                    self.seed_key_field();
                }
            }
            KeyCode::Delete => self.delete_key(),
            KeyCode::Enter => match self.focus {
                Focus::KeyEditor => self.store_key(),
                Focus::ManualEntry => self.manual_send(),
            },
            KeyCode::Backspace => {
                match self.focus {
                    Focus::KeyEditor => self.key_field.pop(),
                    Focus::ManualEntry => self.manual_field.pop(),
                };
            }
            KeyCode::Char(c) => match self.focus {
                Focus::KeyEditor => self.key_field.push(c),
                Focus::ManualEntry => self.manual_field.push(c),
            },
            _ => {}
        }
        false
    }

    fn draw(&self) {
        let mut out = stdout();
        let (_cols, rows) = size().unwrap_or((80, 24));

        _ = out.execute(MoveTo(0, 0));
        _ = out.execute(Clear(ClearType::All));

        println!(
            "\r LOCK STATION CONTROL PANEL      {}",
            self.port_label
        );
        println!("\r");
        println!("\r REGISTERS  (Up/Down select, Del removes key)");
        let selected_name = self.selected_name();
        for (i, name) in self.store.names().enumerate() {
            let marker = if i == self.selected { '>' } else { ' ' };
            let key = self.store.get(name);
            let shown = if key.is_empty() { "(empty)" } else { key };
            println!("\r {} {:<8} {}", marker, name, shown);
        }
        println!("\r");
        let (key_cursor, manual_cursor) = match self.focus {
            Focus::KeyEditor => ('_', ' '),
            Focus::ManualEntry => (' ', '_'),
        };
        println!(
            "\r key for {}> {}{}",
            selected_name.as_deref().unwrap_or("-"),
            self.key_field,
            key_cursor
        );
        println!("\r manual cmd> {}{}", self.manual_field, manual_cursor);
        println!("\r");
        println!("\r MESSAGES  (Tab switches field, Esc quits)");

        // Whatever fits between the header block and the bottom row.
        let header_rows = 8 + self.store.len();
        let visible = (rows as usize).saturating_sub(header_rows + 1).max(1);
        let start = self.log.len().saturating_sub(visible);
        for entry in &self.log[start..] {
            println!("\r  {}", entry);
        }
    }
}

async fn run_panel(mut panel: Panel) {
    let mut reader = EventStream::new();

    loop {
        panel.drain_rx();
        panel.draw();

        let mut delay = Delay::new(TICK).fuse();
        let mut event = reader.next().fuse();

        select! {
            _ = delay => {},
            some_event = event => {
                match some_event {
                    Some(Ok(Event::Key(ev))) => {
                        if panel.handle_key(ev) {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        panel.log_line(format!("[ERROR] - terminal input: {}", e));
                    }
                    None => break,
                }
            }
        }
    }
}

fn main() -> ExitCode {
    let mut opts = Options::new();
    opts.optopt("c", "config", "Config file (YAML)", "path");
    opts.optopt("p", "", "Serial port (overrides config)", "port");
    opts.optopt("b", "", "Baud rate (overrides config)", "rate");
    opts.optflag("", "enum", "Enumerate serial devices, then quit");
    opts.optflag("h", "help", "Print this help");

    let args: Vec<String> = env::args().collect();

    macro_rules! die{
        ($f:expr,$($a:tt)*)=>{
        {
            die!(format!($f, $($a)*));
        }
        };
        ($msg:expr)=>{
        {
            eprintln!("ERROR: {}", $msg);
            return ExitCode::FAILURE;
        }
        };
    }

    let matches = match opts.parse(&args[1..]) {
        Ok(m) => m,
        Err(f) => {
            let usage = format!("Usage: {} [-c config] [-p port] [-b rate]", &args[0]);
            die!("{}\n{}", f, opts.usage(&usage));
        }
    };

    if matches.opt_present("h") {
        let usage = format!("Usage: {} [-c config] [-p port] [-b rate]", &args[0]);
        println!("{}", opts.usage(&usage));
        return ExitCode::SUCCESS;
    }

    if matches.opt_present("enum") {
        enum_ports();
        return ExitCode::SUCCESS;
    }

    let mut config = if let Some(path) = matches.opt_str("c") {
        match PanelConfig::load(Path::new(&path)) {
            Ok(config) => config,
            Err(e) => die!("reading config: {}", e),
        }
    } else {
        PanelConfig::default()
    };
    if let Some(port) = matches.opt_str("p") {
        config.link.port = port;
    }
    if let Some(rate) = matches.opt_str("b") {
        config.link.baud = match rate.parse::<u32>() {
            Ok(rate) => rate,
            Err(_) => die!("invalid baud rate '{}'", rate),
        };
    }

    // Serial open failure is fatal: report and exit, no retry.
    let chan = match Channel::open(
        &config.link.port,
        config.link.baud,
        Duration::from_millis(config.link.timeout_ms),
    ) {
        Ok(chan) => chan,
        Err(e) => die!("opening serial port {}: {:?}", config.link.port, e),
    };
    let rx_chan = match chan.try_clone() {
        Ok(rx_chan) => rx_chan,
        Err(e) => die!("cloning serial handle: {:?}", e),
    };
    let rx = match link::spawn_reader(rx_chan) {
        Ok(rx) => rx,
        Err(e) => die!("starting serial reader thread: {}", e),
    };

    let mut panel = Panel {
        store: RegisterStore::new(&config.registers),
        selected: 0,
        key_field: String::new(),
        manual_field: String::new(),
        focus: Focus::KeyEditor,
        log: Vec::new(),
        port_label: format!("serial {} @ {}", config.link.port, config.link.baud),
        chan,
        rx,
        sfx: SfxPlayer::new(&config.sfx),
    };
    panel.log_line(format!(
        "[READY] - connected to {} at {} baud",
        config.link.port, config.link.baud
    ));
    panel.play_cue(Cue::Startup);

    let mut out = stdout();
    if let Err(e) = enable_raw_mode() {
        die!("setting up terminal: {}", e);
    }
    _ = out.execute(EnterAlternateScreen);
    _ = out.execute(SetBackgroundColor(Color::Black));
    _ = out.execute(SetForegroundColor(Color::Green));
    _ = out.execute(Clear(ClearType::All));
    _ = out.execute(Hide);

    async_std::task::block_on(run_panel(panel));

    // Clean up the terminal; the serial handles close when the panel and
    // the reader thread drop theirs.
    _ = out.execute(LeaveAlternateScreen);
    _ = out.execute(Show);
    _ = disable_raw_mode();

    ExitCode::SUCCESS
}
