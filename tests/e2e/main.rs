// End-to-end tests for the SpeechPipe Backend API
//
// These tests start a real server on an ephemeral port, backed by a scripted
// in-process synthesis client and an in-memory audio joiner, and drive it
// over HTTP. Each test builds its own isolated server, so tests run in
// parallel without shared state.

mod test_speech;
mod test_streaming;
