// HTML bodies for the two booking emails
// Fixed layouts, every submitted value is escaped before substitution

use chrono::{DateTime, Local};

use crate::booking::BookingRequest;

pub const BRAND: &str = "Obinna Events";

#[derive(Debug, Clone)]
pub struct RenderContext {
    pub received_at: DateTime<Local>,
    pub request_id: String,
}

impl RenderContext {
    pub fn new(received_at: DateTime<Local>) -> Self {
        Self {
            request_id: request_id(&received_at),
            received_at,
        }
    }
}

// "#OE" followed by the last six digits of the millisecond timestamp
pub fn request_id(at: &DateTime<Local>) -> String {
    format!("#OE{:06}", at.timestamp_millis().rem_euclid(1_000_000))
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn operator_subject(request: &BookingRequest) -> String {
    format!("🎯 New Booking Request from {}", request.name)
}

pub fn confirmation_subject() -> String {
    format!("🎉 Booking Request Received - {}", BRAND)
}

pub fn render_operator_notification(request: &BookingRequest, ctx: &RenderContext) -> String {
    let name = escape_html(&request.name);
    let email = escape_html(&request.email);
    let phone = request.phone.as_deref().map(escape_html);
    let phone_link = phone.as_deref().unwrap_or("");
    let phone_text = phone.as_deref().unwrap_or("Not provided");
    let event_type = escape_html(&request.event_type);
    let event_date = request
        .event_date
        .as_deref()
        .map(escape_html)
        .unwrap_or_else(|| "Not specified - to be discussed".to_string());
    let message = escape_html(&request.message);
    let received = ctx.received_at.format("%Y-%m-%d %H:%M:%S");

    format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; background-color: #f8f9fa;">
  <div style="background: linear-gradient(135deg, #3D0066 0%, #FFD700 100%); color: white; padding: 30px; text-align: center; border-radius: 8px 8px 0 0;">
    <h1 style="margin: 0; font-size: 28px;">🎯 New Booking Request</h1>
    <p style="margin: 10px 0 0 0; font-size: 16px;">{brand} - Direct Booking</p>
  </div>
  <div style="background-color: white; padding: 30px;">
    <h3 style="color: #3D0066;">👤 Contact Information</h3>
    <p><strong>Name:</strong> {name}</p>
    <p><strong>Email:</strong> <a href="mailto:{email}">{email}</a></p>
    <p><strong>Phone:</strong> <a href="tel:{phone_link}">{phone_text}</a></p>
    <h3 style="color: #3D0066;">🎉 Event Details</h3>
    <p><strong>Event Type:</strong> {event_type}</p>
    <p><strong>Event Date:</strong> {event_date}</p>
    <h3 style="color: #3D0066;">💬 Event Details &amp; Requirements</h3>
    <p style="white-space: pre-wrap; line-height: 1.6;">{message}</p>
    <p style="text-align: center;"><a href="mailto:{email}" style="background-color: #3D0066; color: white; padding: 12px 24px; border-radius: 6px;">Reply to Client</a></p>
  </div>
  <div style="background-color: #3D0066; color: white; padding: 20px; text-align: center; border-radius: 0 0 8px 8px;">
    <p style="margin: 0; font-size: 14px;">
      📧 <strong>Quick Reply:</strong> <a href="mailto:{email}" style="color: #FFD700;">{email}</a><br>
      ⏰ <strong>Received:</strong> {received}<br>
      🎯 <strong>Priority:</strong> Respond within 24 hours
    </p>
  </div>
</div>"#,
        brand = BRAND,
    )
}

pub fn render_submitter_confirmation(request: &BookingRequest, ctx: &RenderContext) -> String {
    let name = escape_html(&request.name);
    let email = escape_html(&request.email);
    let phone = request
        .phone
        .as_deref()
        .map(escape_html)
        .unwrap_or_else(|| "Not provided".to_string());
    let event_type = escape_html(&request.event_type);
    let event_date = request
        .event_date
        .as_deref()
        .map(escape_html)
        .unwrap_or_else(|| "To be discussed".to_string());
    let request_id = &ctx.request_id;

    format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; background-color: #f8f9fa;">
  <div style="background: linear-gradient(135deg, #3D0066 0%, #FFD700 100%); color: white; padding: 40px 30px; text-align: center; border-radius: 8px 8px 0 0;">
    <h1 style="margin: 0; font-size: 32px;">🎉 Thank You, {name}!</h1>
    <p style="margin: 15px 0 0 0; font-size: 18px;">Your booking request has been received</p>
  </div>
  <div style="background-color: white; padding: 40px 30px;">
    <h2 style="color: #3D0066; text-align: center;">What happens next?</h2>
    <ol>
      <li><strong>Quick Review</strong> - We'll review your request within 24 hours and check availability for your event date.</li>
      <li><strong>Personal Contact</strong> - We'll contact you directly to discuss availability, pricing, and customize the perfect package for your event.</li>
      <li><strong>Event Planning</strong> - We'll finalize all the details and start planning to make your event absolutely unforgettable! 🎊</li>
    </ol>
    <h3 style="color: #3D0066;">📋 Your Request Summary</h3>
    <p><strong>Event Type:</strong> {event_type}</p>
    <p><strong>Preferred Date:</strong> {event_date}</p>
    <p><strong>Contact Email:</strong> {email}</p>
    <p><strong>Contact Phone:</strong> {phone}</p>
    <p><strong>Request ID:</strong> <span style="font-family: monospace;">{request_id}</span></p>
    <h4 style="color: #0066cc;">💡 Important Notes:</h4>
    <ul>
      <li>Keep this email for your records</li>
      <li>Check your spam folder if you don't hear from us within 24 hours</li>
      <li>Feel free to reply to this email with any additional questions</li>
    </ul>
    <div style="text-align: center; margin-top: 30px;">
      <p style="color: #666; font-size: 14px; line-height: 1.6;">
        🎭 <strong>Direct bookings only</strong> • No third-party agencies<br>
        📞 <strong>Quick response</strong> • We'll contact you within 24 hours<br>
        ⭐ <strong>Premium service</strong> • Tailored to make your event amazing
      </p>
    </div>
  </div>
  <div style="background-color: #3D0066; color: white; padding: 25px; text-align: center; border-radius: 0 0 8px 8px;">
    <p style="margin: 0; font-size: 14px;">
      <strong>{brand}</strong><br>
      Making every event unforgettable 🎉<br>
      This is an automated confirmation. Please do not reply to this email.
    </p>
  </div>
</div>"#,
        brand = BRAND,
    )
}
