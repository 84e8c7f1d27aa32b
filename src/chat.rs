// Keyword chat responder
// Ordered rules, lowercased substring scan, first match wins

pub const GREETING: &str = "Hello! How can I help you today?";
pub const FALLBACK_REPLY: &str = "I'm not sure about that. Could you ask something else?";

#[derive(Debug, Clone)]
pub struct ChatRule {
    keywords: Vec<String>,
    reply: String,
}

impl ChatRule {
    pub fn new(keywords: &[&str], reply: impl Into<String>) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            reply: reply.into(),
        }
    }

    fn matches(&self, input: &str) -> bool {
        self.keywords.iter().any(|k| input.contains(k.as_str()))
    }
}

#[derive(Debug, Clone)]
pub struct ChatResponder {
    rules: Vec<ChatRule>,
    fallback: String,
}

impl ChatResponder {
    pub fn new(rules: Vec<ChatRule>, fallback: impl Into<String>) -> Self {
        Self {
            rules,
            fallback: fallback.into(),
        }
    }

    pub fn greeting(&self) -> &str {
        GREETING
    }

    /// Reply for `input`, `None` when there is nothing to answer.
    pub fn respond(&self, input: &str) -> Option<&str> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }

        let input = input.to_lowercase();
        let reply = self
            .rules
            .iter()
            .find(|rule| rule.matches(&input))
            .map(|rule| rule.reply.as_str())
            .unwrap_or(self.fallback.as_str());
        Some(reply)
    }
}

impl Default for ChatResponder {
    fn default() -> Self {
        Self::new(knowledge_base(), FALLBACK_REPLY)
    }
}

// Order matters: "booking" must hit "book" before anything else does
fn knowledge_base() -> Vec<ChatRule> {
    vec![
        ChatRule::new(
            &["followers"],
            "417K Instagram · 66.4K YouTube · 200K Facebook",
        ),
        ChatRule::new(
            &["service"],
            "Professional Services:\n\
             • Event MC – $3,000 (2–8 hours)\n\
             • Brand Influencing – $15,000/month (SMEs) to $115,830/year (Corporate)\n\
             • Apology Package – Customizable (1–2 hours)\n\
             • Special Appearance – $1,500 (1–3 hours)\n\
             • Event Management – $3,000 (full service)\n\
             • Sound & DJ Services – $1,500 (4–12 hours)\n\
             • Event Photography – $1,500 (4–8 hours)\n\
             • Meet & Greet – $1,500 (30–60 minutes)",
        ),
        ChatRule::new(
            &["package"],
            "Service Packages:\n\
             • Essential – KSh 75,000 (Half Day Event: 4-hour hosting, MC services, basic sound, timeline management, consultation)\n\
             • Premium – KSh 150,000 (Full Day: MC + Comedy, sound coordination, planning consultation, social coverage, content, VIP meet & greet)\n\
             • Elite – KSh 300,000 (Multi-Day: full entertainment, brand integration, content creation, photography, merchandise, VIP experience)",
        ),
        ChatRule::new(
            &["book"],
            "To book Obinna:\n\
             Email: booking@ogaobinna.com\n\
             Phone/WhatsApp: +254 798 663936\n\
             Booking inquiries: within 24 hours\n\
             Event confirmations: within 48 hours\n\
             Urgent requests: same-day response\n\
             Booking recommended 2–4 weeks in advance; rush bookings may incur additional fees",
        ),
        ChatRule::new(&["phone"], "You can reach Obinna at +254 798 663936."),
        ChatRule::new(&["email"], "You can email Obinna at booking@ogaobinna.com."),
        ChatRule::new(
            &["price"],
            "Pricing depends on the type of event. Please contact Obinna directly for an exact quote.",
        ),
        ChatRule::new(
            &["contact"],
            "Email: booking@ogaobinna.com\n\
             Phone: +254 798 663936 (Text or WhatsApp only)",
        ),
        ChatRule::new(
            &["location"],
            "Location: Nairobi, Kenya (Based in East Africa’s entertainment hub)",
        ),
        ChatRule::new(
            &["hour"],
            "Business Hours:\n\
             Mon–Fri: 9:00 AM – 6:00 PM\n\
             Sat: 10:00 AM – 4:00 PM\n\
             Sunday: Closed",
        ),
        ChatRule::new(
            &["bio"],
            "Oga Obinna (Steve Thompson Magana) is a Kenyan entertainer, comedian, radio host, media personality and content creator known for blending storytelling with contemporary humor.\n\
             Originating from university comedy stages, he's evolved into East Africa’s premier entertainer with 13+ years in comedy, radio, digital, live events, brand partnerships, and motivational speaking.",
        ),
        ChatRule::new(&["hello", "hi"], GREETING),
    ]
}
