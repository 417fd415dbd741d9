fn main() {
  ccnode::main();
}
