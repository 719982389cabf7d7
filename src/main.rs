fn main() {
    procpack::run_cli();
}
