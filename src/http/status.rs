#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpStatus {
    Ok = 200,

    BadRequest = 400,
    PayloadTooLarge = 413,

    InternalServerError = 500,
}

impl HttpStatus {
    pub fn code(self) -> u16 {
        self as u16
    }

    pub fn reason(self) -> &'static str {
        match self {
            HttpStatus::Ok => "OK",                                     // 200
            HttpStatus::BadRequest => "Bad Request",                    // 400
            HttpStatus::PayloadTooLarge => "Payload Too Large",         // 413
            HttpStatus::InternalServerError => "Internal Server Error", // 500
        }
    }

    /// `Status` line of a CGI response.
    pub fn cgi_line(self) -> String {
        format!("Status: {} {}", self.code(), self.reason())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cgi_status_line() {
        assert_eq!(HttpStatus::PayloadTooLarge.cgi_line(), "Status: 413 Payload Too Large");
        assert_eq!(HttpStatus::Ok.code(), 200);
    }
}
