#![forbid(unsafe_code)]

//! Script model: screens of typed text and waits.
//!
//! A [`Script`] is immutable once built. All variability at playback time
//! comes from the randomized per-character delay, never from the content.
//!
//! Each [`Screen`] starts with an implicit clear. Within a screen,
//! [`Op::Type`] appends text one grapheme at a time and [`Op::Wait`]
//! suspends without touching the buffer.

use std::borrow::Cow;
use std::fmt;

use unicode_segmentation::UnicodeSegmentation;

/// Base per-character delay used when a script does not specify one.
pub const DEFAULT_TYPE_DELAY_MS: u64 = 22;

/// One playback operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    /// Append `text` grapheme by grapheme, pausing about `base_delay_ms`
    /// after each visible one.
    Type {
        text: Cow<'static, str>,
        base_delay_ms: u64,
    },
    /// Suspend for exactly `ms`.
    Wait { ms: u64 },
}

impl Op {
    pub fn typed(text: impl Into<Cow<'static, str>>, base_delay_ms: u64) -> Self {
        Self::Type {
            text: text.into(),
            base_delay_ms,
        }
    }

    pub fn wait(ms: u64) -> Self {
        Self::Wait { ms }
    }

    /// Whether playing this op can take a non-zero amount of time.
    pub fn suspends(&self) -> bool {
        match self {
            Self::Wait { ms } => *ms > 0,
            Self::Type {
                text,
                base_delay_ms,
            } => *base_delay_ms > 0 && text.graphemes(true).any(|g| !is_delay_exempt(g)),
        }
    }
}

/// Spaces and line breaks are appended without a pause.
pub fn is_delay_exempt(grapheme: &str) -> bool {
    matches!(grapheme, " " | "\n" | "\r\n")
}

/// A named clear-then-play unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    name: Cow<'static, str>,
    ops: Vec<Op>,
}

impl Screen {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            ops: Vec::new(),
        }
    }

    /// Append a typing op.
    #[must_use]
    pub fn type_text(mut self, text: impl Into<Cow<'static, str>>, base_delay_ms: u64) -> Self {
        self.ops.push(Op::typed(text, base_delay_ms));
        self
    }

    /// Append a typing op at [`DEFAULT_TYPE_DELAY_MS`].
    #[must_use]
    pub fn type_default(self, text: impl Into<Cow<'static, str>>) -> Self {
        self.type_text(text, DEFAULT_TYPE_DELAY_MS)
    }

    /// Append a wait.
    #[must_use]
    pub fn wait(mut self, ms: u64) -> Self {
        self.ops.push(Op::wait(ms));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }
}

/// Why a script was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    /// No screens at all.
    Empty,
    /// No op in the whole cycle takes time, so playback would never yield.
    NeverSuspends,
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "script has no screens"),
            Self::NeverSuspends => {
                write!(f, "script never suspends: add a wait or a delayed character")
            }
        }
    }
}

impl std::error::Error for ScriptError {}

/// Ordered, cyclic sequence of screens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    screens: Vec<Screen>,
}

impl Script {
    /// Validate and build a script.
    ///
    /// # Errors
    ///
    /// [`ScriptError::Empty`] without screens; [`ScriptError::NeverSuspends`]
    /// when no op in the cycle takes time.
    pub fn new(screens: Vec<Screen>) -> Result<Self, ScriptError> {
        if screens.is_empty() {
            return Err(ScriptError::Empty);
        }
        if !screens.iter().flat_map(|s| s.ops.iter()).any(Op::suspends) {
            return Err(ScriptError::NeverSuspends);
        }
        Ok(Self { screens })
    }

    pub fn screens(&self) -> &[Screen] {
        &self.screens
    }

    pub fn len(&self) -> usize {
        self.screens.len()
    }

    /// Always `false` for a validated script.
    pub fn is_empty(&self) -> bool {
        self.screens.is_empty()
    }

    /// The built-in bulletin-board session.
    pub fn bulletin_board() -> Self {
        Self {
            screens: bulletin_board_screens(),
        }
    }
}

impl Default for Script {
    fn default() -> Self {
        Self::bulletin_board()
    }
}

/// Screen names of the built-in session, in playback order.
pub const BULLETIN_BOARD_SCREENS: [&str; 9] = [
    "welcome",
    "message-areas",
    "message-body",
    "files-prompt",
    "file-areas",
    "file-list",
    "bulletins-prompt",
    "bulletin-board",
    "goodbye",
];

fn bulletin_board_screens() -> Vec<Screen> {
    vec![
        Screen::new(BULLETIN_BOARD_SCREENS[0])
            .wait(300)
            .type_text("================================\n", 4)
            .type_text("   M E T A V E R S O  B B S   \n", 16)
            .type_text("   v2.1  *  Nodo 1/4  * 14400  \n", 10)
            .type_text("================================\n", 4)
            .type_default("\n")
            .type_text("Bienvenido, SYSOP!\n", 28)
            .type_text("Ultima conn: Hoy 14:32 hs\n", 20)
            .type_text("Mensajes nuevos: 7\n", 20)
            .type_default("\n")
            .type_text("[M]ensajes   [F]icheros\n", 16)
            .type_text("[C]hat       [G]ames\n", 16)
            .type_text("[B]oards     [?]Ayuda\n", 16)
            .type_text("[Q]uit\n\n", 16)
            .type_text("Seleccion: ", 26)
            .wait(2400)
            .type_text("M\n", 40)
            .wait(500),
        Screen::new(BULLETIN_BOARD_SCREENS[1])
            .wait(200)
            .type_text("-- AREAS DE MENSAJES --\n\n", 10)
            .type_text("1. General        [247 msgs]\n", 16)
            .type_text("2. Tecnologia     [189 msgs]\n", 16)
            .type_text("3. Juegos         [312 msgs]\n", 16)
            .type_text("4. Programacion   [ 98 msgs]\n", 16)
            .type_text("5. Humor & Ocio   [421 msgs]\n", 16)
            .type_text("6. Warez/Demos    [ 67 msgs]\n", 16)
            .type_text("\nArea [INTRO=todos]: ", 20)
            .wait(1900)
            .type_text("3\n", 40)
            .wait(500),
        Screen::new(BULLETIN_BOARD_SCREENS[2])
            .wait(200)
            .type_text("JUEGOS - Mensajes nuevos\n", 10)
            .type_text("------------------------\n", 4)
            .type_text("De:    Pirata_80\n", 20)
            .type_text("Para:  TODOS\n", 20)
            .type_text("Fecha: 23/02/88 22:14\n", 20)
            .type_text("Asunto: Space Wars - nivel 7\n\n", 20)
            .type_text("Gente, descubri el truco del\n", 20)
            .type_text("nivel 7: hay que esperar al\n", 20)
            .type_text("enemigo en la esquina izq y\n", 20)
            .type_text("disparar cuando gira...\n", 20)
            .wait(2800)
            .type_text("\n[INTRO] siguiente msg: ", 20)
            .wait(2000)
            .type_default("\n")
            .wait(500),
        Screen::new(BULLETIN_BOARD_SCREENS[3])
            .wait(200)
            .type_text("Seleccion: ", 26)
            .wait(1300)
            .type_text("F\n", 40)
            .wait(500),
        Screen::new(BULLETIN_BOARD_SCREENS[4])
            .wait(200)
            .type_text("-- FICHEROS DISPONIBLES --\n\n", 10)
            .type_text("[A] Aplicaciones\n", 16)
            .type_text("[J] Juegos         NEW!\n", 16)
            .type_text("[D] Demos/Intros\n", 16)
            .type_text("[M] Musica MOD\n", 16)
            .type_text("[U] Subir fichero\n", 16)
            .type_text("\nSeccion: ", 22)
            .wait(1600)
            .type_text("J\n", 40)
            .wait(500),
        Screen::new(BULLETIN_BOARD_SCREENS[5])
            .wait(200)
            .type_text("JUEGOS - 14 ficheros\n", 10)
            .type_text("--------------------\n", 4)
            .type_text("ZORK3.ZIP     192K  Zork III\n", 16)
            .type_text("MANMINE.ZIP   48K   Manic Miner\n", 16)
            .type_text("ELITE.ZIP     112K  Elite C64\n", 16)
            .type_text("PITFALL.ZIP   34K   Pitfall II\n", 16)
            .type_text("\nDescargar [nombre/Q]: ", 22)
            .wait(2000)
            .type_text("Q\n", 40)
            .wait(500),
        Screen::new(BULLETIN_BOARD_SCREENS[6])
            .wait(200)
            .type_text("Seleccion: ", 26)
            .wait(1200)
            .type_text("B\n", 40)
            .wait(500),
        Screen::new(BULLETIN_BOARD_SCREENS[7])
            .wait(200)
            .type_text("-- TABLON DE ANUNCIOS --\n\n", 10)
            .type_text("* MAINT: Sabado 03:00-06:00\n", 16)
            .type_text("* NUEVO: Area de Demos!\n", 16)
            .type_text("* TOP10 mensual activo\n", 16)
            .type_text("* Chat grupal: mierc 22hs\n", 16)
            .type_text("* Nuevo nodo 4 operativo!\n", 16)
            .type_text("\n[INTRO] para continuar: ", 22)
            .wait(2600)
            .type_default("\n")
            .wait(600),
        Screen::new(BULLETIN_BOARD_SCREENS[8])
            .wait(200)
            .type_text("Seleccion: ", 26)
            .wait(1200)
            .type_text("Q\n\n", 40)
            .wait(300)
            .type_text("Gracias por llamar a\n", 22)
            .type_text("METAVERSO BBS!\n\n", 16)
            .type_text("Hasta la proxima, SYSOP.\n", 22)
            .type_text("Desconectando...\n", 20)
            .wait(2200),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bulletin_board_passes_validation() {
        let script = Script::bulletin_board();
        let rebuilt = Script::new(script.screens().to_vec()).unwrap();
        assert_eq!(rebuilt, script);
    }

    #[test]
    fn bulletin_board_screen_order() {
        let script = Script::bulletin_board();
        let names: Vec<&str> = script.screens().iter().map(Screen::name).collect();
        assert_eq!(names, BULLETIN_BOARD_SCREENS);
        assert_eq!(script.len(), 9);
    }

    #[test]
    fn every_screen_ends_with_a_wait() {
        for screen in Script::bulletin_board().screens() {
            assert!(
                matches!(screen.ops().last(), Some(Op::Wait { .. })),
                "{} does not end with a wait",
                screen.name()
            );
        }
    }

    #[test]
    fn banner_lines_fit_the_screen() {
        for screen in Script::bulletin_board().screens() {
            for op in screen.ops() {
                if let Op::Type { text, .. } = op {
                    for line in text.split('\n') {
                        assert!(line.len() <= 32, "{line:?} is too wide");
                    }
                }
            }
        }
    }

    #[test]
    fn empty_script_is_rejected() {
        assert_eq!(Script::new(Vec::new()), Err(ScriptError::Empty));
    }

    #[test]
    fn script_without_time_is_rejected() {
        let screens = vec![
            Screen::new("a").type_text(" \n \n", 50).wait(0),
            Screen::new("b").type_text("visible", 0),
        ];
        assert_eq!(Script::new(screens), Err(ScriptError::NeverSuspends));
    }

    #[test]
    fn single_wait_is_enough() {
        let screens = vec![Screen::new("a").type_text("x", 0).wait(1)];
        assert!(Script::new(screens).is_ok());
    }

    #[test]
    fn exempt_graphemes() {
        assert!(is_delay_exempt(" "));
        assert!(is_delay_exempt("\n"));
        assert!(is_delay_exempt("\r\n"));
        assert!(!is_delay_exempt("a"));
        assert!(!is_delay_exempt("\t"));
    }

    #[test]
    fn error_messages() {
        assert_eq!(ScriptError::Empty.to_string(), "script has no screens");
        assert!(ScriptError::NeverSuspends.to_string().contains("never suspends"));
    }
}
