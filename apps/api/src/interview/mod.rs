// Interview practice feedback.
//
// Body-language analysis is simulated: scores are random draws that never look
// at the uploaded media. The response carries `simulated: true` so clients can
// tell.

pub mod analyzer;
pub mod handlers;
