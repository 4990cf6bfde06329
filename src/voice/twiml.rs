//! TwiML Builder
//!
//! A small verb tree that renders the call-control markup the telephony
//! provider executes on a live call. Every verb kind carries a fixed wire
//! name and a fixed set of child kinds it may contain; attributes come from
//! a per-verb options struct and are frozen at construction.

use super::{Result, TwimlError};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// XML declaration prepended to documents served over HTTP
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Verb kinds known to the document model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerbKind {
    Response,
    Say,
    Play,
    Pause,
    Redirect,
    Hangup,
    Gather,
    Number,
    Dial,
    Record,
    Conference,
    Sms,
}

impl VerbKind {
    /// Element name written to the document
    pub const fn name(self) -> &'static str {
        match self {
            VerbKind::Response => "Response",
            VerbKind::Say => "Say",
            VerbKind::Play => "Play",
            VerbKind::Pause => "Pause",
            VerbKind::Redirect => "Redirect",
            VerbKind::Hangup => "Hangup",
            VerbKind::Gather => "Gather",
            VerbKind::Number => "Number",
            VerbKind::Dial => "Dial",
            VerbKind::Record => "Record",
            VerbKind::Conference => "Conference",
            VerbKind::Sms => "Sms",
        }
    }

    /// Child kinds this verb may contain. Empty for leaf verbs.
    pub const fn nestables(self) -> &'static [VerbKind] {
        use VerbKind::*;
        match self {
            Response => &[Say, Play, Gather, Record, Dial, Redirect, Pause, Hangup, Sms],
            Gather => &[Say, Play, Pause],
            Dial => &[Number, Conference],
            _ => &[],
        }
    }

    /// Whether `child` may be appended under this kind
    pub fn can_nest(self, child: VerbKind) -> bool {
        self.nestables().contains(&child)
    }
}

impl fmt::Display for VerbKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Say voice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum Voice {
    Man,
    Woman,
}

impl Voice {
    pub const fn as_str(self) -> &'static str {
        match self {
            Voice::Man => "man",
            Voice::Woman => "woman",
        }
    }
}

impl FromStr for Voice {
    type Err = TwimlError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "man" => Ok(Voice::Man),
            "woman" => Ok(Voice::Woman),
            other => Err(TwimlError::InvalidAttribute {
                attribute: "voice",
                value: other.to_string(),
                allowed: "'man' or 'woman'",
            }),
        }
    }
}

/// Say language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum Language {
    English,
    Spanish,
    French,
    German,
}

impl Language {
    pub const fn as_str(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Spanish => "es",
            Language::French => "fr",
            Language::German => "de",
        }
    }
}

impl FromStr for Language {
    type Err = TwimlError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "en" => Ok(Language::English),
            "es" => Ok(Language::Spanish),
            "fr" => Ok(Language::French),
            "de" => Ok(Language::German),
            other => Err(TwimlError::InvalidAttribute {
                attribute: "language",
                value: other.to_string(),
                allowed: "'en', 'es', 'fr', or 'de'",
            }),
        }
    }
}

/// HTTP method used for callback URLs (`method`, `waitMethod`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub const fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }

    /// Parse a value supplied for the named attribute
    pub fn parse_for(attribute: &'static str, value: &str) -> Result<Self> {
        match value {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            other => Err(TwimlError::InvalidAttribute {
                attribute,
                value: other.to_string(),
                allowed: "'GET' or 'POST'",
            }),
        }
    }
}

impl FromStr for Method {
    type Err = TwimlError;

    fn from_str(s: &str) -> Result<Self> {
        Method::parse_for("method", s)
    }
}

macro_rules! enum_conversions {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }

            impl TryFrom<String> for $ty {
                type Error = TwimlError;

                fn try_from(value: String) -> Result<Self> {
                    value.parse()
                }
            }
        )*
    };
}

enum_conversions!(Voice, Language, Method);

/// Attribute map, sorted by wire name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(BTreeMap<&'static str, String>);

impl Attributes {
    fn with<V: ToString>(mut self, name: &'static str, value: Option<V>) -> Self {
        if let Some(value) = value {
            self.0.insert(name, value.to_string());
        }
        self
    }

    /// Raw (unescaped) value of an attribute
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(k, v)| (*k, v.as_str()))
    }
}

/// Response options
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ResponseOptions {
    /// API version, e.g. 2008-08-01
    pub version: Option<String>,
}

impl ResponseOptions {
    fn attributes(&self) -> Attributes {
        Attributes::default().with("version", self.version.as_deref())
    }
}

/// Say options
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SayOptions {
    pub voice: Option<Voice>,
    pub language: Option<Language>,
    /// Number of times to say the text
    #[serde(rename = "loop")]
    pub loop_count: Option<u32>,
}

impl SayOptions {
    fn attributes(&self) -> Attributes {
        Attributes::default()
            .with("voice", self.voice)
            .with("language", self.language)
            .with("loop", self.loop_count)
    }
}

/// Play options
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PlayOptions {
    #[serde(rename = "loop")]
    pub loop_count: Option<u32>,
}

impl PlayOptions {
    fn attributes(&self) -> Attributes {
        Attributes::default().with("loop", self.loop_count)
    }
}

/// Pause options
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PauseOptions {
    /// Length of the pause in seconds
    pub length: Option<u32>,
}

impl PauseOptions {
    fn attributes(&self) -> Attributes {
        Attributes::default().with("length", self.length)
    }
}

/// Redirect options
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RedirectOptions {
    pub method: Option<Method>,
}

impl RedirectOptions {
    fn attributes(&self) -> Attributes {
        Attributes::default().with("method", self.method)
    }
}

/// Gather options
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GatherOptions {
    /// URL the gathered digits are submitted to
    pub action: Option<String>,
    pub method: Option<Method>,
    pub num_digits: Option<u32>,
    pub timeout: Option<u32>,
    pub finish_on_key: Option<String>,
}

impl GatherOptions {
    fn attributes(&self) -> Attributes {
        Attributes::default()
            .with("action", self.action.as_deref())
            .with("method", self.method)
            .with("numDigits", self.num_digits)
            .with("timeout", self.timeout)
            .with("finishOnKey", self.finish_on_key.as_deref())
    }
}

/// Number options
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NumberOptions {
    /// Keys to press after the number connects
    pub send_digits: Option<String>,
}

impl NumberOptions {
    fn attributes(&self) -> Attributes {
        Attributes::default().with("sendDigits", self.send_digits.as_deref())
    }
}

/// Sms options
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SmsOptions {
    pub to: Option<String>,
    /// Sending number, written as the `from` attribute
    pub sender: Option<String>,
    pub method: Option<Method>,
    pub action: Option<String>,
    pub status_callback: Option<String>,
}

impl SmsOptions {
    fn attributes(&self) -> Attributes {
        Attributes::default()
            .with("to", self.to.as_deref())
            .with("from", self.sender.as_deref())
            .with("method", self.method)
            .with("action", self.action.as_deref())
            .with("statusCallback", self.status_callback.as_deref())
    }
}

/// Conference options
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConferenceOptions {
    pub muted: Option<bool>,
    pub beep: Option<bool>,
    pub start_conference_on_enter: Option<bool>,
    pub end_conference_on_exit: Option<bool>,
    pub wait_url: Option<String>,
    #[serde(default, deserialize_with = "deserialize_wait_method")]
    pub wait_method: Option<Method>,
}

impl ConferenceOptions {
    fn attributes(&self) -> Attributes {
        Attributes::default()
            .with("muted", self.muted)
            .with("beep", self.beep)
            .with("startConferenceOnEnter", self.start_conference_on_enter)
            .with("endConferenceOnExit", self.end_conference_on_exit)
            .with("waitUrl", self.wait_url.as_deref())
            .with("waitMethod", self.wait_method)
    }
}

fn deserialize_wait_method<'de, D>(deserializer: D) -> std::result::Result<Option<Method>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    value
        .map(|v| Method::parse_for("waitMethod", &v))
        .transpose()
        .map_err(serde::de::Error::custom)
}

/// Dial options
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DialOptions {
    /// URL the dial result is submitted to
    pub action: Option<String>,
    pub method: Option<Method>,
}

impl DialOptions {
    fn attributes(&self) -> Attributes {
        Attributes::default()
            .with("action", self.action.as_deref())
            .with("method", self.method)
    }
}

/// Record options
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RecordOptions {
    pub action: Option<String>,
    pub method: Option<Method>,
    /// Maximum recording length in seconds
    pub max_length: Option<u32>,
    /// Seconds of silence that end the recording
    pub timeout: Option<u32>,
    pub transcribe: Option<bool>,
    pub transcribe_callback: Option<String>,
    pub play_beep: Option<bool>,
}

impl RecordOptions {
    fn attributes(&self) -> Attributes {
        Attributes::default()
            .with("action", self.action.as_deref())
            .with("method", self.method)
            .with("maxLength", self.max_length)
            .with("timeout", self.timeout)
            .with("transcribe", self.transcribe)
            .with("transcribeCallback", self.transcribe_callback.as_deref())
            .with("playBeep", self.play_beep)
    }
}

/// A node in a call-control document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verb {
    kind: VerbKind,
    attributes: Attributes,
    body: Option<String>,
    children: Vec<Verb>,
}

impl Verb {
    fn build(kind: VerbKind, attributes: Attributes, body: Option<String>) -> Self {
        Self {
            kind,
            attributes,
            body: body.filter(|b| !b.is_empty()),
            children: Vec::new(),
        }
    }

    /// Root of a document
    pub fn response(options: ResponseOptions) -> Self {
        Self::build(VerbKind::Response, options.attributes(), None)
    }

    /// Speak `text` to the caller
    pub fn say(text: impl Into<String>, options: SayOptions) -> Self {
        Self::build(VerbKind::Say, options.attributes(), Some(text.into()))
    }

    /// Play the audio file at `url`
    pub fn play(url: impl Into<String>, options: PlayOptions) -> Self {
        Self::build(VerbKind::Play, options.attributes(), Some(url.into()))
    }

    pub fn pause(options: PauseOptions) -> Self {
        Self::build(VerbKind::Pause, options.attributes(), None)
    }

    /// Continue call flow at another document URL
    pub fn redirect(url: impl Into<String>, options: RedirectOptions) -> Self {
        Self::build(VerbKind::Redirect, options.attributes(), Some(url.into()))
    }

    pub fn hangup() -> Self {
        Self::build(VerbKind::Hangup, Attributes::default(), None)
    }

    /// Collect keypad digits
    pub fn gather(options: GatherOptions) -> Self {
        Self::build(VerbKind::Gather, options.attributes(), None)
    }

    /// Phone number inside a Dial
    pub fn number(number: impl Into<String>, options: NumberOptions) -> Self {
        Self::build(VerbKind::Number, options.attributes(), Some(number.into()))
    }

    /// Send a text message
    pub fn sms(msg: impl Into<String>, options: SmsOptions) -> Self {
        Self::build(VerbKind::Sms, options.attributes(), Some(msg.into()))
    }

    /// Named conference room inside a Dial
    pub fn conference(name: impl Into<String>, options: ConferenceOptions) -> Self {
        Self::build(VerbKind::Conference, options.attributes(), Some(name.into()))
    }

    /// Connect the call to another party.
    ///
    /// A comma-separated `number` list becomes one `Number` child per entry
    /// instead of a body.
    pub fn dial(number: Option<&str>, options: DialOptions) -> Self {
        let mut dial = Self::build(VerbKind::Dial, options.attributes(), None);
        match number {
            Some(list) if list.contains(',') => {
                dial.children = list
                    .split(',')
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .map(|n| Verb::number(n, NumberOptions::default()))
                    .collect();
            }
            other => dial.body = other.filter(|n| !n.is_empty()).map(str::to_string),
        }
        dial
    }

    /// Record the caller
    pub fn record(options: RecordOptions) -> Self {
        Self::build(VerbKind::Record, options.attributes(), None)
    }

    pub fn kind(&self) -> VerbKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    pub fn children(&self) -> &[Verb] {
        &self.children
    }

    /// Append a child verb, returning it for further nesting
    pub fn append(&mut self, child: Verb) -> Result<&mut Verb> {
        if self.kind.nestables().is_empty() {
            return Err(TwimlError::NotNestable(self.kind.name()));
        }
        if !self.kind.can_nest(child.kind) {
            return Err(TwimlError::NestingViolation {
                child: child.kind.name(),
                parent: self.kind.name(),
            });
        }
        let index = self.children.len();
        self.children.push(child);
        Ok(&mut self.children[index])
    }

    pub fn add_say(&mut self, text: impl Into<String>, options: SayOptions) -> Result<&mut Verb> {
        self.append(Verb::say(text, options))
    }

    pub fn add_play(&mut self, url: impl Into<String>, options: PlayOptions) -> Result<&mut Verb> {
        self.append(Verb::play(url, options))
    }

    pub fn add_pause(&mut self, options: PauseOptions) -> Result<&mut Verb> {
        self.append(Verb::pause(options))
    }

    pub fn add_redirect(
        &mut self,
        url: impl Into<String>,
        options: RedirectOptions,
    ) -> Result<&mut Verb> {
        self.append(Verb::redirect(url, options))
    }

    pub fn add_hangup(&mut self) -> Result<&mut Verb> {
        self.append(Verb::hangup())
    }

    pub fn add_gather(&mut self, options: GatherOptions) -> Result<&mut Verb> {
        self.append(Verb::gather(options))
    }

    pub fn add_number(
        &mut self,
        number: impl Into<String>,
        options: NumberOptions,
    ) -> Result<&mut Verb> {
        self.append(Verb::number(number, options))
    }

    pub fn add_dial(&mut self, number: Option<&str>, options: DialOptions) -> Result<&mut Verb> {
        self.append(Verb::dial(number, options))
    }

    pub fn add_record(&mut self, options: RecordOptions) -> Result<&mut Verb> {
        self.append(Verb::record(options))
    }

    pub fn add_conference(
        &mut self,
        name: impl Into<String>,
        options: ConferenceOptions,
    ) -> Result<&mut Verb> {
        self.append(Verb::conference(name, options))
    }

    pub fn add_sms(&mut self, msg: impl Into<String>, options: SmsOptions) -> Result<&mut Verb> {
        self.append(Verb::sms(msg, options))
    }

    /// Percent-encoded markup, for passing a document inside a URL parameter.
    /// `/` is left literal so closing tags read `%3C/Say%3E`.
    pub fn to_url_encoded(&self) -> String {
        urlencoding::encode(&self.to_string()).replace("%2F", "/")
    }

    /// Markup prefixed with the XML declaration, ready to serve as a body
    pub fn to_document(&self) -> String {
        format!("{}\n{}", XML_DECLARATION, self)
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.kind.name();
        write!(f, "<{}", name)?;
        for (key, value) in self.attributes.iter() {
            write!(f, " {}=\"{}\"", key, escape_attribute(value))?;
        }

        if self.body.is_none() && self.children.is_empty() {
            return f.write_str("/>");
        }

        f.write_str(">")?;
        if let Some(body) = &self.body {
            f.write_str(&escape_text(body))?;
        }
        if !self.children.is_empty() {
            f.write_str("\n")?;
            for child in &self.children {
                for line in child.to_string().split('\n') {
                    writeln!(f, "\t{}", line)?;
                }
            }
        }
        write!(f, "</{}>", name)
    }
}

/// Escape character data
pub fn escape_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape a value for a double-quoted attribute
pub fn escape_attribute(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            '\t' => out.push_str("&#9;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verb_names_are_fixed_per_kind() {
        assert_eq!(Verb::hangup().name(), "Hangup");
        assert_eq!(Verb::say("hi", SayOptions::default()).name(), "Say");
        assert_eq!(Verb::dial(None, DialOptions::default()).name(), "Dial");
        assert_eq!(VerbKind::Sms.to_string(), "Sms");
    }

    #[test]
    fn test_leaf_verb_renders_self_closing() {
        assert_eq!(Verb::hangup().to_string(), "<Hangup/>");
        assert_eq!(
            Verb::pause(PauseOptions { length: Some(2) }).to_string(),
            r#"<Pause length="2"/>"#
        );
    }

    #[test]
    fn test_attributes_sorted_by_name() {
        let say = Verb::say(
            "Hello",
            SayOptions {
                voice: Some(Voice::Man),
                loop_count: Some(2),
                ..Default::default()
            },
        );
        assert_eq!(say.to_string(), r#"<Say loop="2" voice="man">Hello</Say>"#);
    }

    #[test]
    fn test_body_is_escaped() {
        let say = Verb::say("Tom & Jerry <3", SayOptions::default());
        assert_eq!(say.to_string(), "<Say>Tom &amp; Jerry &lt;3</Say>");
    }

    #[test]
    fn test_attribute_values_are_escaped() {
        let gather = Verb::gather(GatherOptions {
            action: Some(r#"/next?a=1&b="2""#.to_string()),
            ..Default::default()
        });
        assert_eq!(
            gather.to_string(),
            r#"<Gather action="/next?a=1&amp;b=&quot;2&quot;"/>"#
        );
        assert_eq!(escape_attribute("a\tb\nc"), "a&#9;b&#10;c");
    }

    #[test]
    fn test_absent_options_are_not_rendered() {
        let record = Verb::record(RecordOptions::default());
        assert!(record.attributes().is_empty());
        assert_eq!(record.to_string(), "<Record/>");
    }

    #[test]
    fn test_sms_sender_maps_to_from() {
        let sms = Verb::sms(
            "hi",
            SmsOptions {
                to: Some("+15055550100".to_string()),
                sender: Some("+15055550199".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(sms.attributes().get("from"), Some("+15055550199"));
        assert_eq!(sms.attributes().get("sender"), None);
        assert_eq!(
            sms.to_string(),
            r#"<Sms from="+15055550199" to="+15055550100">hi</Sms>"#
        );
    }

    #[test]
    fn test_boolean_attributes_render_lowercase() {
        let conf = Verb::conference(
            "standup",
            ConferenceOptions {
                muted: Some(false),
                beep: Some(true),
                ..Default::default()
            },
        );
        assert_eq!(
            conf.to_string(),
            r#"<Conference beep="true" muted="false">standup</Conference>"#
        );
    }

    #[test]
    fn test_invalid_enumerations_rejected() {
        assert!(matches!(
            "robot".parse::<Voice>(),
            Err(TwimlError::InvalidAttribute { attribute: "voice", .. })
        ));
        assert!(matches!(
            "it".parse::<Language>(),
            Err(TwimlError::InvalidAttribute { attribute: "language", .. })
        ));
        assert!(matches!(
            "PUT".parse::<Method>(),
            Err(TwimlError::InvalidAttribute { attribute: "method", .. })
        ));
        assert!("get".parse::<Method>().is_err());
        assert!(matches!(
            Method::parse_for("waitMethod", "PATCH"),
            Err(TwimlError::InvalidAttribute { attribute: "waitMethod", .. })
        ));
    }

    #[test]
    fn test_valid_enumerations_accepted() {
        assert_eq!("woman".parse::<Voice>().unwrap(), Voice::Woman);
        assert_eq!("de".parse::<Language>().unwrap(), Language::German);
        assert_eq!("POST".parse::<Method>().unwrap(), Method::Post);
    }

    #[test]
    fn test_options_deserialize_with_validation() {
        let opts: SayOptions =
            serde_json::from_value(serde_json::json!({"voice": "woman", "loop": 3})).unwrap();
        assert_eq!(opts.voice, Some(Voice::Woman));
        assert_eq!(opts.loop_count, Some(3));

        let err = serde_json::from_value::<SayOptions>(serde_json::json!({"voice": "robot"}))
            .unwrap_err();
        assert!(err.to_string().contains("voice"));

        let err = serde_json::from_value::<ConferenceOptions>(
            serde_json::json!({"waitMethod": "PUT"}),
        )
        .unwrap_err();
        assert!(err.to_string().contains("waitMethod"));
    }

    #[test]
    fn test_options_reject_unknown_fields() {
        let result =
            serde_json::from_value::<PlayOptions>(serde_json::json!({"volume": 11}));
        assert!(result.is_err());
    }

    #[test]
    fn test_leaf_append_fails() {
        let mut say = Verb::say("hi", SayOptions::default());
        let err = say.append(Verb::hangup()).unwrap_err();
        assert_eq!(err, TwimlError::NotNestable("Say"));
        assert_eq!(err.to_string(), "Say is not nestable");
        assert!(say.children().is_empty());
    }

    #[test]
    fn test_disallowed_child_fails() {
        let mut gather = Verb::gather(GatherOptions::default());
        let err = gather.add_dial(Some("4155551212"), DialOptions::default()).unwrap_err();
        assert_eq!(
            err,
            TwimlError::NestingViolation {
                child: "Dial",
                parent: "Gather"
            }
        );
        assert_eq!(err.to_string(), "Dial is not nestable inside Gather");
        assert!(gather.add_say("Press 1", SayOptions::default()).is_ok());
        assert_eq!(gather.children().len(), 1);
    }

    #[test]
    fn test_nesting_table_matches_append() {
        let kinds = [
            VerbKind::Response,
            VerbKind::Say,
            VerbKind::Play,
            VerbKind::Pause,
            VerbKind::Redirect,
            VerbKind::Hangup,
            VerbKind::Gather,
            VerbKind::Number,
            VerbKind::Dial,
            VerbKind::Record,
            VerbKind::Conference,
            VerbKind::Sms,
        ];
        let sample = |kind: VerbKind| match kind {
            VerbKind::Response => Verb::response(ResponseOptions::default()),
            VerbKind::Say => Verb::say("x", SayOptions::default()),
            VerbKind::Play => Verb::play("x", PlayOptions::default()),
            VerbKind::Pause => Verb::pause(PauseOptions::default()),
            VerbKind::Redirect => Verb::redirect("x", RedirectOptions::default()),
            VerbKind::Hangup => Verb::hangup(),
            VerbKind::Gather => Verb::gather(GatherOptions::default()),
            VerbKind::Number => Verb::number("x", NumberOptions::default()),
            VerbKind::Dial => Verb::dial(Some("x"), DialOptions::default()),
            VerbKind::Record => Verb::record(RecordOptions::default()),
            VerbKind::Conference => Verb::conference("x", ConferenceOptions::default()),
            VerbKind::Sms => Verb::sms("x", SmsOptions::default()),
        };

        for parent in kinds {
            for child in kinds {
                let mut node = sample(parent);
                let result = node.append(sample(child));
                assert_eq!(
                    result.is_ok(),
                    parent.can_nest(child),
                    "{} inside {}",
                    child,
                    parent
                );
            }
        }
    }

    #[test]
    fn test_append_returns_child_for_chaining() {
        let mut response = Verb::response(ResponseOptions::default());
        response
            .add_gather(GatherOptions {
                num_digits: Some(1),
                ..Default::default()
            })
            .unwrap()
            .add_say("Press one", SayOptions::default())
            .unwrap();
        assert_eq!(
            response.to_string(),
            "<Response>\n\t<Gather numDigits=\"1\">\n\t\t<Say>Press one</Say>\n\t</Gather>\n</Response>"
        );
    }

    #[test]
    fn test_dial_expands_number_list() {
        let dial = Verb::dial(Some("4155551212, 4155551213"), DialOptions::default());
        assert_eq!(dial.body(), None);
        let numbers: Vec<_> = dial.children().iter().map(|c| c.body().unwrap()).collect();
        assert_eq!(numbers, ["4155551212", "4155551213"]);
        assert!(dial.children().iter().all(|c| c.kind() == VerbKind::Number));
        assert_eq!(
            dial.to_string(),
            "<Dial>\n\t<Number>4155551212</Number>\n\t<Number>4155551213</Number>\n</Dial>"
        );
    }

    #[test]
    fn test_dial_single_number_is_body() {
        let dial = Verb::dial(
            Some("4155551212"),
            DialOptions {
                method: Some(Method::Get),
                ..Default::default()
            },
        );
        assert!(dial.children().is_empty());
        assert_eq!(dial.to_string(), r#"<Dial method="GET">4155551212</Dial>"#);
    }

    #[test]
    fn test_body_and_children_render_together() {
        let mut dial = Verb::dial(Some("4155551212"), DialOptions::default());
        dial.add_conference("room", ConferenceOptions::default()).unwrap();
        assert_eq!(
            dial.to_string(),
            "<Dial>4155551212\n\t<Conference>room</Conference>\n</Dial>"
        );
    }

    #[test]
    fn test_render_is_idempotent() {
        let mut response = Verb::response(ResponseOptions::default());
        response.add_say("Hello", SayOptions::default()).unwrap();
        response.add_dial(Some("1,2"), DialOptions::default()).unwrap();
        let first = response.to_string();
        let second = response.to_string();
        assert_eq!(first, second);
    }

    #[test]
    fn test_url_encoded() {
        let say = Verb::say("Hi there", SayOptions::default());
        assert_eq!(say.to_url_encoded(), "%3CSay%3EHi%20there%3C/Say%3E");
    }

    #[test]
    fn test_url_encoded_keeps_slashes() {
        let mut response = Verb::response(ResponseOptions::default());
        response
            .add_play("http://example.com/a b.mp3", PlayOptions::default())
            .unwrap();
        response.add_hangup().unwrap();
        assert_eq!(
            response.to_url_encoded(),
            "%3CResponse%3E%0A%09%3CPlay%3Ehttp%3A//example.com/a%20b.mp3%3C/Play%3E%0A%09%3CHangup/%3E%0A%3C/Response%3E"
        );
    }

    #[test]
    fn test_document_has_declaration() {
        let response = Verb::response(ResponseOptions::default());
        assert_eq!(
            response.to_document(),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Response/>"
        );
    }
}
